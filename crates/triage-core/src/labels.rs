//! Allowed label vocabularies for classification.
//!
//! The priority and category vocabularies are derived from whatever labelled
//! data is at hand: the source dataset for a labeling run, the prediction
//! ledger or the demo artifact for single-request re-triage. The same set is
//! used to build the response schema and to validate the model's output.

use std::collections::BTreeSet;

use crate::ticket::{DemoExample, LabelResult, SourceRecord};

/// Sorted, deduplicated priority and category vocabularies.
///
/// Empty strings are never members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedLabels {
    pub priorities: Vec<String>,
    pub categories: Vec<String>,
}

impl AllowedLabels {
    /// Build from raw priority and category values.
    pub fn new<P, C>(priorities: P, categories: C) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            priorities: vocabulary(priorities),
            categories: vocabulary(categories),
        }
    }

    /// Resident-selected labels from the source dataset.
    pub fn from_records(records: &[SourceRecord]) -> Self {
        Self::new(
            records.iter().map(|r| r.priority.as_str()),
            records.iter().map(|r| r.category.as_str()),
        )
    }

    /// Labels already assigned in the prediction ledger.
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a LabelResult>) -> Self {
        let (priorities, categories): (Vec<&str>, Vec<&str>) = results
            .into_iter()
            .map(|r| (r.priority.as_str(), r.category.as_str()))
            .unzip();
        Self::new(priorities, categories)
    }

    /// Resident-selected labels from curated demo examples.
    pub fn from_demo_examples(examples: &[DemoExample]) -> Self {
        Self::new(
            examples.iter().map(|e| e.resident_priority.as_str()),
            examples.iter().map(|e| e.resident_category.as_str()),
        )
    }

    /// True when both vocabularies have at least one value.
    pub fn is_usable(&self) -> bool {
        !self.priorities.is_empty() && !self.categories.is_empty()
    }

    pub fn allows_priority(&self, value: &str) -> bool {
        self.priorities.binary_search_by(|p| p.as_str().cmp(value)).is_ok()
    }

    pub fn allows_category(&self, value: &str) -> bool {
        self.categories.binary_search_by(|c| c.as_str().cmp(value)).is_ok()
    }
}

fn vocabulary<I>(values: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| v.as_ref().trim().to_string())
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
