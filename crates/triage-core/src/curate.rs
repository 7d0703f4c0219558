//! Demo-example curation: a deterministic, priority-balanced,
//! category-diverse sample of labelled tickets.
//!
//! Selection runs in three stages:
//!
//! 1. Per-priority quotas as equal as availability allows
//!    ([`priority_targets`]).
//! 2. Round-robin over priorities in sorted order. Each turn picks the
//!    candidate whose category is least represented so far, re-scored on
//!    every pick because the running counts change.
//! 3. A top-up pass by global category count if quotas left slots empty.
//!
//! All randomness comes from one seed: the tiebreak order is a seeded
//! shuffle of the population, and the final output order is a second
//! shuffle from a fresh generator with the same seed.

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::CoreError;
use crate::ticket::DemoExample;

pub const DEFAULT_EXAMPLE_COUNT: usize = 30;
pub const DEFAULT_SEED: u64 = 42;

/// Seeded selector for a fixed-size demo set.
#[derive(Debug, Clone, Copy)]
pub struct Curator {
    n: usize,
    seed: u64,
}

impl Default for Curator {
    fn default() -> Self {
        Self {
            n: DEFAULT_EXAMPLE_COUNT,
            seed: DEFAULT_SEED,
        }
    }
}

impl Curator {
    pub fn new(n: usize, seed: u64) -> Result<Self, CoreError> {
        if n == 0 {
            return Err(CoreError::Config("example count must be positive".into()));
        }
        Ok(Self { n, seed })
    }

    pub fn count(&self) -> usize {
        self.n
    }

    /// Select exactly `n` examples from `population`.
    ///
    /// Rows with a repeated id are dropped (first occurrence wins) before
    /// anything else. Fails with [`CoreError::InsufficientData`] when fewer
    /// than `n` distinct rows remain.
    pub fn curate(&self, population: &[DemoExample]) -> Result<Vec<DemoExample>, CoreError> {
        let mut seen_ids = HashSet::new();
        let mut arena: Vec<&DemoExample> = population
            .iter()
            .filter(|e| seen_ids.insert(e.id))
            .collect();

        if arena.len() < self.n {
            return Err(CoreError::InsufficientData {
                required: self.n,
                available: arena.len(),
            });
        }

        arena.shuffle(&mut StdRng::seed_from_u64(self.seed));

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for example in &arena {
            *counts.entry(example.resident_priority.clone()).or_default() += 1;
        }
        let targets = priority_targets(&counts, self.n);
        debug!(?targets, population = arena.len(), "priority targets");

        let mut picked: Vec<DemoExample> = select(&arena, &targets, self.n)
            .into_iter()
            .map(|pos| arena[pos].clone())
            .collect();

        picked.shuffle(&mut StdRng::seed_from_u64(self.seed));
        picked.truncate(self.n);
        Ok(picked)
    }
}

/// Per-priority quotas for `n` slots, as balanced as availability allows.
///
/// Starts from an equal split (the first `n mod k` priorities in sorted order
/// get one extra), caps each priority at its row count, then hands the
/// shortfall one slot at a time to priorities with spare rows, least-assigned
/// first. Stops when nothing more can be placed; `n` is clamped to the total
/// row count.
pub fn priority_targets(counts: &BTreeMap<String, usize>, n: usize) -> BTreeMap<String, usize> {
    if counts.is_empty() {
        return BTreeMap::new();
    }

    let n = n.min(counts.values().sum());
    let base = n / counts.len();
    let remainder = n % counts.len();

    let mut targets: BTreeMap<String, usize> = counts
        .keys()
        .enumerate()
        .map(|(i, p)| (p.clone(), base + usize::from(i < remainder)))
        .collect();

    let mut deficit = 0usize;
    for (priority, target) in targets.iter_mut() {
        let available = counts[priority];
        if *target > available {
            deficit += *target - available;
            *target = available;
        }
    }

    while deficit > 0 {
        let mut order: Vec<String> = counts.keys().cloned().collect();
        order.sort_by(|a, b| (targets[a], a).cmp(&(targets[b], b)));

        let mut progressed = false;
        for priority in &order {
            let available = counts[priority];
            let Some(target) = targets.get_mut(priority) else {
                continue;
            };
            if available <= *target {
                continue;
            }
            *target += 1;
            deficit -= 1;
            progressed = true;
            if deficit == 0 {
                break;
            }
        }
        if !progressed {
            break;
        }
    }

    targets
}

/// Running category counts shared by every pick of one curation.
#[derive(Default)]
struct CategoryTally<'a> {
    global: HashMap<&'a str, usize>,
    per_priority: HashMap<(&'a str, &'a str), usize>,
}

impl<'a> CategoryTally<'a> {
    fn global(&self, category: &str) -> usize {
        self.global.get(category).copied().unwrap_or(0)
    }

    /// Lower is better: unseen category, then globally rarest, then rarest
    /// within this priority, then tiebreak position.
    fn score(&self, priority: &'a str, category: &'a str, position: usize) -> (u8, usize, usize, usize) {
        let global = self.global(category);
        let within = self
            .per_priority
            .get(&(priority, category))
            .copied()
            .unwrap_or(0);
        (u8::from(global > 0), global, within, position)
    }

    fn record(&mut self, priority: &'a str, category: &'a str) {
        *self.global.entry(category).or_default() += 1;
        *self.per_priority.entry((priority, category)).or_default() += 1;
    }
}

/// Pick arena positions honouring `targets`, then top up to `n`.
fn select(arena: &[&DemoExample], targets: &BTreeMap<String, usize>, n: usize) -> Vec<usize> {
    // Candidate pools per priority, in tiebreak order.
    let mut pools: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (pos, &example) in arena.iter().enumerate() {
        pools
            .entry(example.resident_priority.as_str())
            .or_default()
            .push(pos);
    }

    let mut remaining = targets.clone();
    let mut tally = CategoryTally::default();
    let mut taken = vec![false; arena.len()];
    let mut selected = Vec::with_capacity(n);

    loop {
        let mut made_pick = false;

        for (priority, quota) in remaining.iter_mut() {
            if *quota == 0 {
                continue;
            }
            let Some(pool) = pools.get_mut(priority.as_str()) else {
                *quota = 0;
                continue;
            };
            let best = pool
                .iter()
                .enumerate()
                .min_by_key(|&(_, &pos)| {
                    let example = arena[pos];
                    tally.score(&example.resident_priority, &example.resident_category, pos)
                })
                .map(|(slot, _)| slot);
            let Some(slot) = best else {
                *quota = 0;
                continue;
            };

            let pos = pool.remove(slot);
            let example: &DemoExample = arena[pos];
            tally.record(&example.resident_priority, &example.resident_category);
            taken[pos] = true;
            selected.push(pos);
            *quota -= 1;
            made_pick = true;
        }

        if !made_pick {
            break;
        }
    }

    if selected.len() < n {
        let need = n - selected.len();
        let mut rest: Vec<usize> = (0..arena.len()).filter(|&pos| !taken[pos]).collect();
        rest.sort_by_key(|&pos| (tally.global(&arena[pos].resident_category), pos));
        debug!(need, available = rest.len(), "topping up demo selection");
        selected.extend(rest.into_iter().take(need));
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(id: i64, priority: &str, category: &str) -> DemoExample {
        DemoExample {
            id,
            resident_priority: priority.into(),
            resident_category: category.into(),
            comment: format!("comment {id}"),
            ai_priority: priority.into(),
            ai_category: category.into(),
            suggested_actions: "We are on it.".into(),
        }
    }

    fn counts(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
        pairs.iter().map(|(p, c)| (p.to_string(), *c)).collect()
    }

    /// `rows` tickets per priority, categories assigned cyclically.
    fn population(layout: &[(&str, usize)], categories: &[&str]) -> Vec<DemoExample> {
        let mut out = Vec::new();
        let mut id = 0;
        for (priority, rows) in layout {
            for i in 0..*rows {
                id += 1;
                out.push(example(id, priority, categories[i % categories.len()]));
            }
        }
        out
    }

    fn per_priority(selection: &[DemoExample]) -> BTreeMap<String, usize> {
        let mut out = BTreeMap::new();
        for e in selection {
            *out.entry(e.resident_priority.clone()).or_default() += 1;
        }
        out
    }

    #[test]
    fn equal_split_when_plentiful() {
        let targets = priority_targets(&counts(&[("A", 500), ("B", 500)]), 30);
        assert_eq!(targets, counts(&[("A", 15), ("B", 15)]));
    }

    #[test]
    fn remainder_goes_to_first_sorted_priorities() {
        let targets = priority_targets(&counts(&[("C", 50), ("A", 50), ("B", 50)]), 32);
        assert_eq!(targets, counts(&[("A", 11), ("B", 11), ("C", 10)]));
    }

    #[test]
    fn shortfall_redistributed_without_losing_slots() {
        let targets = priority_targets(&counts(&[("A", 5), ("B", 995)]), 30);
        assert_eq!(targets, counts(&[("A", 5), ("B", 25)]));
        assert_eq!(targets.values().sum::<usize>(), 30);
    }

    #[test]
    fn shortfall_prefers_least_assigned() {
        // base 3 + 1 extra for A; A and B capped, 4 slots to hand out.
        let targets = priority_targets(&counts(&[("A", 1), ("B", 2), ("C", 100), ("D", 100)]), 13);
        assert_eq!(targets["A"], 1);
        assert_eq!(targets["B"], 2);
        assert_eq!(targets["C"] + targets["D"], 10);
        assert!(targets["C"].abs_diff(targets["D"]) <= 1);
    }

    #[test]
    fn unresolvable_deficit_clamps_to_total() {
        let targets = priority_targets(&counts(&[("A", 2), ("B", 3)]), 30);
        assert_eq!(targets, counts(&[("A", 2), ("B", 3)]));
    }

    #[test]
    fn no_priorities_no_targets() {
        assert!(priority_targets(&BTreeMap::new(), 30).is_empty());
    }

    #[test]
    fn exactly_n_distinct_ids() {
        let pop = population(&[("A", 40), ("B", 40), ("C", 40)], &["X", "Y", "Z", "W"]);
        let picked = Curator::default().curate(&pop).unwrap();
        assert_eq!(picked.len(), 30);
        let ids: HashSet<i64> = picked.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), 30);
    }

    #[test]
    fn balanced_across_priorities() {
        let pop = population(&[("A", 500), ("B", 500)], &["X", "Y", "Z"]);
        let picked = Curator::default().curate(&pop).unwrap();
        assert_eq!(per_priority(&picked), counts(&[("A", 15), ("B", 15)]));
    }

    #[test]
    fn scarce_priority_fully_used() {
        let pop = population(&[("A", 5), ("B", 995)], &["X", "Y"]);
        let picked = Curator::default().curate(&pop).unwrap();
        assert_eq!(per_priority(&picked), counts(&[("A", 5), ("B", 25)]));
    }

    #[test]
    fn rare_categories_are_preferred() {
        let mut pop = Vec::new();
        for id in 1..=20 {
            pop.push(example(id, "A", "Common"));
        }
        pop.push(example(21, "A", "Rare1"));
        pop.push(example(22, "A", "Rare2"));

        let picked = Curator::new(3, 7).unwrap().curate(&pop).unwrap();
        let categories: HashSet<&str> = picked.iter().map(|e| e.resident_category.as_str()).collect();
        assert_eq!(categories, HashSet::from(["Common", "Rare1", "Rare2"]));
    }

    #[test]
    fn categories_spread_before_repeating() {
        let pop = population(&[("A", 60), ("B", 60)], &["P", "Q", "R", "S", "T", "U"]);
        let picked = Curator::new(12, 1).unwrap().curate(&pop).unwrap();
        let mut by_category: HashMap<&str, usize> = HashMap::new();
        for e in &picked {
            *by_category.entry(e.resident_category.as_str()).or_default() += 1;
        }
        assert_eq!(by_category.len(), 6);
        assert!(by_category.values().all(|&c| c == 2));
    }

    #[test]
    fn deterministic_for_same_seed() {
        let pop = population(&[("A", 50), ("B", 70), ("C", 9)], &["X", "Y", "Z", "W", "V"]);
        let first: Vec<i64> = Curator::default().curate(&pop).unwrap().iter().map(|e| e.id).collect();
        let second: Vec<i64> = Curator::default().curate(&pop).unwrap().iter().map(|e| e.id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn different_seed_changes_selection_or_order() {
        let pop = population(&[("A", 50), ("B", 50)], &["X", "Y", "Z"]);
        let a: Vec<i64> = Curator::new(30, 1).unwrap().curate(&pop).unwrap().iter().map(|e| e.id).collect();
        let b: Vec<i64> = Curator::new(30, 2).unwrap().curate(&pop).unwrap().iter().map(|e| e.id).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn insufficient_population() {
        let pop = population(&[("A", 10)], &["X"]);
        let err = Curator::default().curate(&pop).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientData {
                required: 30,
                available: 10
            }
        ));
    }

    #[test]
    fn duplicate_ids_do_not_count_towards_population() {
        let mut pop = population(&[("A", 25)], &["X"]);
        let dupes: Vec<DemoExample> = pop.iter().take(5).cloned().collect();
        pop.extend(dupes);
        assert_eq!(pop.len(), 30);
        let err = Curator::default().curate(&pop).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientData { available: 25, .. }));
    }

    #[test]
    fn zero_count_rejected() {
        assert!(matches!(Curator::new(0, 1), Err(CoreError::Config(_))));
    }

    #[test]
    fn top_up_prefers_least_selected_categories() {
        let rows = [
            example(1, "A", "X"),
            example(2, "A", "X"),
            example(3, "B", "Y"),
            example(4, "B", "Z"),
        ];
        let arena: Vec<&DemoExample> = rows.iter().collect();
        // Quota only for A; the remaining two slots come from the top-up.
        let targets = counts(&[("A", 1), ("B", 0)]);
        let picked = select(&arena, &targets, 3);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked[0], 0);
        // Y and Z are unselected categories, X already has one pick.
        assert_eq!(&picked[1..], &[2, 3]);
    }
}
