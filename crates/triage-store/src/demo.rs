//! Demo artifact: source records joined with their AI labels.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use tracing::{info, warn};
use triage_core::tables::{self, demo};
use triage_core::{DemoExample, SourceRecord};

use crate::StoreError;
use crate::ledger::LedgerMap;
use crate::table::{
    missing_columns, parse_id, read_text_csv, text_column, text_value, write_csv_atomic,
};

/// Inner join of source records with ledger labels, in source order.
///
/// Each id appears once; the first source row wins.
pub fn join_examples(records: &[SourceRecord], labels: &LedgerMap) -> Vec<DemoExample> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.id))
        .filter_map(|r| labels.get(&r.id).map(|label| DemoExample::join(r, label)))
        .collect()
}

/// Write the curated set, replacing any previous artifact atomically.
pub fn write_demo(path: &Path, examples: &[DemoExample]) -> Result<(), StoreError> {
    let batch = RecordBatch::try_new(
        Arc::new(tables::demo_schema()),
        vec![
            Arc::new(Int64Array::from_iter_values(examples.iter().map(|e| e.id))),
            text_array(examples.iter().map(|e| e.resident_priority.as_str())),
            text_array(examples.iter().map(|e| e.resident_category.as_str())),
            text_array(examples.iter().map(|e| e.comment.as_str())),
            text_array(examples.iter().map(|e| e.ai_priority.as_str())),
            text_array(examples.iter().map(|e| e.ai_category.as_str())),
            text_array(examples.iter().map(|e| e.suggested_actions.as_str())),
        ],
    )?;
    write_csv_atomic(path, &batch)?;
    info!(rows = examples.len(), path = %path.display(), "wrote demo examples");
    Ok(())
}

fn text_array<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

/// Read a demo artifact. Repeated ids keep the last row.
pub fn load_demo(path: &Path) -> Result<Vec<DemoExample>, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }
    let table = read_text_csv(path)?;
    let missing = missing_columns(&table.columns, demo::REQUIRED);
    if !missing.is_empty() {
        return Err(StoreError::Schema {
            path: path.to_path_buf(),
            missing,
        });
    }

    let mut examples: Vec<DemoExample> = Vec::with_capacity(table.num_rows());
    let mut dropped = 0usize;
    for batch in &table.batches {
        let ids = text_column(batch, demo::ID)?;
        let resident_priority = text_column(batch, demo::RESIDENT_PRIORITY)?;
        let resident_category = text_column(batch, demo::RESIDENT_CATEGORY)?;
        let comment = text_column(batch, demo::COMMENT)?;
        let ai_priority = text_column(batch, demo::AI_PRIORITY)?;
        let ai_category = text_column(batch, demo::AI_CATEGORY)?;
        let actions = text_column(batch, demo::SUGGESTED_ACTIONS)?;

        for row in 0..batch.num_rows() {
            let Some(id) = parse_id(&text_value(ids, row)) else {
                dropped += 1;
                continue;
            };
            let example = DemoExample {
                id,
                resident_priority: text_value(resident_priority, row),
                resident_category: text_value(resident_category, row),
                comment: text_value(comment, row),
                ai_priority: text_value(ai_priority, row),
                ai_category: text_value(ai_category, row),
                suggested_actions: text_value(actions, row),
            };
            match examples.iter_mut().find(|e| e.id == id) {
                Some(existing) => *existing = example,
                None => examples.push(example),
            }
        }
    }

    if dropped > 0 {
        warn!(dropped, path = %path.display(), "dropped demo rows with non-integer ids");
    }
    Ok(examples)
}
