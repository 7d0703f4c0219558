//! Labeling pipeline: pending tickets → batched model calls → ledger.

use std::time::Instant;

use anyhow::{Context, bail};
use tracing::{info, warn};
use triage_ai::{Governor, LabelClient, LabelContract, label_batch};
use triage_core::{AllowedLabels, BatchItem, CoreError, SourceRecord, chunk};
use triage_store::{Ledger, pending};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every source ticket already had a label.
    NothingPending,
    /// Every pending batch was attempted.
    Completed,
    /// The per-run call cap was reached with batches left over.
    StoppedByQuota,
    /// A batch failed in strict mode.
    Aborted,
}

#[derive(Debug, Clone)]
pub struct BatchFailure {
    /// Zero-based batch index within this run.
    pub index: usize,
    pub ids: Vec<i64>,
    pub reason: String,
}

#[derive(Debug)]
pub struct RunReport {
    pub status: RunStatus,
    pub pending: usize,
    pub batches_total: usize,
    pub calls_made: u32,
    pub labeled: usize,
    pub failures: Vec<BatchFailure>,
    pub snapshot_rows: usize,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct LabelSettings {
    pub batch_size: usize,
    pub strict: bool,
}

/// Label every ticket without a ledger entry, within the governor's limits.
///
/// Validated batches are appended to the log as they arrive; the snapshot is
/// rebuilt from snapshot and log once the loop ends, whatever the outcome.
pub async fn run_label_pipeline(
    records: &[SourceRecord],
    ledger: &Ledger,
    client: &dyn LabelClient,
    governor: &Governor,
    settings: LabelSettings,
) -> anyhow::Result<RunReport> {
    let start = Instant::now();
    if settings.batch_size == 0 {
        return Err(CoreError::Config("batch size must be positive".into()).into());
    }

    let reconciled = ledger.reconcile().context("reconciling ledger")?;
    let done = reconciled.done_ids();
    let todo = pending(records, &done);
    info!(
        source = records.len(),
        labeled = done.len(),
        pending = todo.len(),
        "computed pending work"
    );

    if todo.is_empty() {
        let snapshot_rows = if reconciled.changed > 0 {
            ledger.merge().context("merging ledger snapshot")?.entries.len()
        } else {
            reconciled.entries.len()
        };
        return Ok(RunReport {
            status: RunStatus::NothingPending,
            pending: 0,
            batches_total: 0,
            calls_made: 0,
            labeled: 0,
            failures: Vec::new(),
            snapshot_rows,
            elapsed_secs: start.elapsed().as_secs_f64(),
        });
    }

    let allowed = AllowedLabels::from_records(records);
    if !allowed.is_usable() {
        bail!("source has no priority or category labels to classify against");
    }
    let contract = LabelContract::new(allowed);

    let batches: Vec<&[&SourceRecord]> = chunk(&todo, settings.batch_size)?.collect();
    let batches_total = batches.len();
    eprintln!(
        "  {} pending tickets in {batches_total} batches of up to {}",
        todo.len(),
        settings.batch_size
    );

    let mut status = RunStatus::Completed;
    let mut calls_made = 0u32;
    let mut labeled = 0usize;
    let mut failures = Vec::new();

    for (index, group) in batches.iter().enumerate() {
        if !governor.should_continue(calls_made) {
            info!(calls_made, remaining = batches_total - index, "call quota reached");
            status = RunStatus::StoppedByQuota;
            break;
        }
        if calls_made > 0 {
            governor.throttle().await;
        }

        let items: Vec<BatchItem> = group.iter().map(|r| BatchItem::from(*r)).collect();
        calls_made += 1;
        match label_batch(client, &items, &contract).await {
            Ok(results) => {
                ledger
                    .append(&results)
                    .context("appending results to ledger log")?;
                labeled += results.len();
                eprintln!(
                    "  Batch {}/{batches_total}: labeled {} ({labeled} this run)",
                    index + 1,
                    results.len()
                );
            }
            Err(err) => {
                warn!(batch = index + 1, error = %err, "batch failed");
                eprintln!("  Batch {}/{batches_total}: failed: {err}", index + 1);
                failures.push(BatchFailure {
                    index,
                    ids: items.iter().map(|i| i.id).collect(),
                    reason: err.to_string(),
                });
                if settings.strict {
                    status = RunStatus::Aborted;
                    break;
                }
            }
        }
    }

    let merged = ledger.merge().context("merging ledger snapshot")?;
    info!(
        ?status,
        calls_made,
        labeled,
        failed = failures.len(),
        "labeling run finished"
    );

    Ok(RunReport {
        status,
        pending: todo.len(),
        batches_total,
        calls_made,
        labeled,
        failures,
        snapshot_rows: merged.entries.len(),
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}
