//! Labeling progress without model calls.

use anyhow::Context;
use triage_core::{CoreError, SourceRecord, batch_count};
use triage_store::{Ledger, pending};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub source_rows: usize,
    pub labeled: usize,
    pub pending: usize,
    pub batches_needed: usize,
    pub log_entries: usize,
    pub snapshot_rows: usize,
}

pub fn ledger_status(
    records: &[SourceRecord],
    ledger: &Ledger,
    batch_size: usize,
) -> anyhow::Result<StatusReport> {
    if batch_size == 0 {
        return Err(CoreError::Config("batch size must be positive".into()).into());
    }
    let snapshot_rows = ledger
        .load_snapshot()
        .context("reading ledger snapshot")?
        .len();
    let reconciled = ledger.reconcile().context("reconciling ledger")?;
    let done = reconciled.done_ids();
    let todo = pending(records, &done).len();

    Ok(StatusReport {
        source_rows: records.len(),
        labeled: records.len() - todo,
        pending: todo,
        batches_needed: batch_count(todo, batch_size)?,
        log_entries: reconciled.log_entries,
        snapshot_rows,
    })
}
