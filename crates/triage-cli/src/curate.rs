//! Demo artifact curation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;
use triage_core::{Curator, SourceRecord};
use triage_store::{Ledger, join_examples, write_demo};

#[derive(Debug, Clone)]
pub struct CurationSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub priorities: usize,
    pub categories: usize,
}

/// Join labeled tickets with their source rows, curate, and write the
/// artifact. Nothing is written when curation fails.
pub fn run_curation(
    records: &[SourceRecord],
    ledger: &Ledger,
    demo_path: &Path,
    curator: &Curator,
) -> anyhow::Result<CurationSummary> {
    let labels = ledger.reconcile().context("reconciling ledger")?.entries;
    let population = join_examples(records, &labels);
    info!(
        labeled = labels.len(),
        joined = population.len(),
        "joined labels with source"
    );

    let selected = curator
        .curate(&population)
        .context("selecting demo examples")?;
    write_demo(demo_path, &selected)
        .with_context(|| format!("writing {}", demo_path.display()))?;

    let priorities: BTreeSet<&str> = selected
        .iter()
        .map(|e| e.resident_priority.as_str())
        .collect();
    let categories: BTreeSet<&str> = selected
        .iter()
        .map(|e| e.resident_category.as_str())
        .collect();

    Ok(CurationSummary {
        path: demo_path.to_path_buf(),
        rows: selected.len(),
        priorities: priorities.len(),
        categories: categories.len(),
    })
}
