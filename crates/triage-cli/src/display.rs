//! Plain-text reports for the terminal.
//!
//! Each report is rendered to a `String` first so the layout can be checked
//! without capturing stdout.

use std::fmt::Write;

use triage_core::{BatchItem, DemoExample, LabelResult};

use crate::curate::CurationSummary;
use crate::label::{RunReport, RunStatus};
use crate::status::StatusReport;

const MAX_LISTED_IDS: usize = 10;
const SNIPPET_CHARS: usize = 90;

// ── Re-triage card ──

/// Resident selection vs AI label for one request.
pub struct TriageCard<'a> {
    pub id: i64,
    pub comment: &'a str,
    pub resident_priority: &'a str,
    pub resident_category: &'a str,
    pub ai_priority: &'a str,
    pub ai_category: &'a str,
    pub suggested_actions: &'a str,
}

impl<'a> TriageCard<'a> {
    pub fn from_example(example: &'a DemoExample) -> Self {
        Self {
            id: example.id,
            comment: &example.comment,
            resident_priority: &example.resident_priority,
            resident_category: &example.resident_category,
            ai_priority: &example.ai_priority,
            ai_category: &example.ai_category,
            suggested_actions: &example.suggested_actions,
        }
    }

    pub fn from_request(item: &'a BatchItem, label: &'a LabelResult) -> Self {
        Self {
            id: item.id,
            comment: &item.comment,
            resident_priority: item.resident_selected_priority.as_deref().unwrap_or("-"),
            resident_category: item.resident_selected_category.as_deref().unwrap_or("-"),
            ai_priority: &label.priority,
            ai_category: &label.category,
            suggested_actions: &label.suggested_actions,
        }
    }
}

pub fn render_card(card: &TriageCard<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Request #{} ===", card.id);
    let _ = writeln!(out, "{}", card.comment);
    let _ = writeln!(out);

    let _ = writeln!(out, "{:<12} {:<22} {}", "", "Resident", "AI re-triage");
    row_pair(&mut out, "Priority", card.resident_priority, card.ai_priority);
    row_pair(&mut out, "Category", card.resident_category, card.ai_category);
    let _ = writeln!(out);

    let _ = writeln!(out, "Message to resident");
    let _ = writeln!(out, "  {}", card.suggested_actions);
    out
}

fn row_pair(out: &mut String, label: &str, resident: &str, ai: &str) {
    let marker = if resident == ai { "" } else { "  (changed)" };
    let _ = writeln!(out, "{label:<12} {resident:<22} {ai}{marker}");
}

pub fn print_card(card: &TriageCard<'_>) {
    print!("{}", render_card(card));
}

// ── Example list ──

/// `#id | priority | category | snippet`, the comment cut to
/// [`SNIPPET_CHARS`] characters.
pub fn example_line(example: &DemoExample) -> String {
    let mut snippet: String = example.comment.chars().take(SNIPPET_CHARS).collect();
    if example.comment.chars().count() > SNIPPET_CHARS {
        snippet.push('…');
    }
    format!(
        "#{} | {} | {} | {}",
        example.id, example.resident_priority, example.resident_category, snippet
    )
}

pub fn print_example_list(examples: &[DemoExample]) {
    for example in examples {
        println!("{}", example_line(example));
    }
}

// ── Run reports ──

fn status_line(status: RunStatus) -> &'static str {
    match status {
        RunStatus::NothingPending => "nothing pending",
        RunStatus::Completed => "completed",
        RunStatus::StoppedByQuota => "stopped: call quota reached",
        RunStatus::Aborted => "aborted after a failed batch",
    }
}

fn row(out: &mut String, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "  {label:<20} {value}");
}

pub fn render_run_report(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Labeling run: {}", status_line(report.status));
    row(&mut out, "pending at start", report.pending);
    row(&mut out, "batches", report.batches_total);
    row(&mut out, "calls made", report.calls_made);
    row(&mut out, "labeled", report.labeled);
    row(&mut out, "failed batches", report.failures.len());
    row(&mut out, "snapshot rows", report.snapshot_rows);
    row(&mut out, "elapsed", format!("{:.1}s", report.elapsed_secs));

    for failure in &report.failures {
        let shown: Vec<String> = failure
            .ids
            .iter()
            .take(MAX_LISTED_IDS)
            .map(i64::to_string)
            .collect();
        let more = failure.ids.len().saturating_sub(MAX_LISTED_IDS);
        let suffix = if more > 0 {
            format!(" (+{more} more)")
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "  batch {} [{}{suffix}]: {}",
            failure.index + 1,
            shown.join(", "),
            failure.reason
        );
    }
    out
}

pub fn print_run_report(report: &RunReport) {
    print!("{}", render_run_report(report));
}

pub fn render_status(status: &StatusReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Ledger status");
    row(&mut out, "source rows", status.source_rows);
    row(&mut out, "labeled", status.labeled);
    row(&mut out, "pending", status.pending);
    row(&mut out, "batches needed", status.batches_needed);
    row(&mut out, "log entries", status.log_entries);
    row(&mut out, "snapshot rows", status.snapshot_rows);
    out
}

pub fn print_status(status: &StatusReport) {
    print!("{}", render_status(status));
}

pub fn print_curation_summary(summary: &CurationSummary) {
    println!(
        "Wrote {} demo examples to {} ({} priorities, {} categories)",
        summary.rows,
        summary.path.display(),
        summary.priorities,
        summary.categories
    );
}
