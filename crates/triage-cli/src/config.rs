//! Command-line configuration.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use triage_ai::{DEFAULT_MODEL, GeminiClient};
use triage_ai::governor::{DEFAULT_MAX_CALLS, DEFAULT_MIN_INTERVAL_SECS};
use triage_core::curate::{DEFAULT_EXAMPLE_COUNT, DEFAULT_SEED};
use triage_store::OnLedgerCorrupt;

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Resumable batch labeling of maintenance tickets.
#[derive(Parser, Debug)]
#[command(name = "triage", version, about)]
pub struct Cli {
    /// Source ticket export (CSV)
    #[arg(long, env = "TRIAGE_SOURCE", default_value = "data/source.csv", global = true)]
    pub source: PathBuf,

    /// Deduplicated label snapshot (CSV)
    #[arg(long, env = "TRIAGE_SNAPSHOT", default_value = "data/predictions.csv", global = true)]
    pub snapshot: PathBuf,

    /// Append-only label log (JSONL)
    #[arg(long, env = "TRIAGE_LOG", default_value = "data/predictions.jsonl", global = true)]
    pub log: PathBuf,

    /// Curated demo examples (CSV)
    #[arg(long, env = "TRIAGE_DEMO", default_value = "data/demo_examples.csv", global = true)]
    pub demo: PathBuf,

    /// What to do with an unreadable snapshot or log
    #[arg(long, value_enum, default_value_t = LedgerPolicy::TreatAsEmpty, global = true)]
    pub on_ledger_corrupt: LedgerPolicy,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Label pending tickets in batches and merge them into the snapshot
    Label(LabelArgs),
    /// Select a balanced set of labeled tickets for the demo
    Curate(CurateArgs),
    /// Show a cached demo label or re-triage a typed request
    Retriage(RetriageArgs),
    /// Report labeling progress without calling the model
    Status(StatusArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerPolicy {
    TreatAsEmpty,
    Fail,
}

impl From<LedgerPolicy> for OnLedgerCorrupt {
    fn from(policy: LedgerPolicy) -> Self {
        match policy {
            LedgerPolicy::TreatAsEmpty => OnLedgerCorrupt::TreatAsEmpty,
            LedgerPolicy::Fail => OnLedgerCorrupt::Fail,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Model name
    #[arg(long, env = "TRIAGE_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// API key for the model endpoint
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl ModelArgs {
    pub fn client(&self) -> anyhow::Result<GeminiClient> {
        let key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .context("GEMINI_API_KEY is not set")?;
        Ok(GeminiClient::new(key.to_string(), self.model.clone()))
    }
}

#[derive(Args, Debug)]
pub struct LabelArgs {
    /// Tickets per classification call
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Minimum seconds between consecutive calls
    #[arg(long, default_value_t = DEFAULT_MIN_INTERVAL_SECS)]
    pub min_interval_secs: f64,

    /// Maximum classification calls in this run
    #[arg(long, default_value_t = DEFAULT_MAX_CALLS)]
    pub max_calls: u32,

    /// Stop at the first failed batch
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Args, Debug)]
pub struct CurateArgs {
    /// Number of examples to select
    #[arg(long, default_value_t = DEFAULT_EXAMPLE_COUNT)]
    pub count: usize,

    /// Seed for tiebreak and output order
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

#[derive(Args, Debug)]
pub struct RetriageArgs {
    /// List the curated demo examples
    #[arg(long, conflicts_with_all = ["example", "comment"])]
    pub list: bool,

    /// Id of a curated demo example
    #[arg(long, conflicts_with = "comment", required_unless_present_any = ["comment", "list"])]
    pub example: Option<i64>,

    /// Free-text maintenance request
    #[arg(long)]
    pub comment: Option<String>,

    /// Resident-selected priority
    #[arg(long, requires = "comment")]
    pub priority: Option<String>,

    /// Resident-selected service category
    #[arg(long, requires = "comment")]
    pub category: Option<String>,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Batch size used to estimate remaining calls
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}
