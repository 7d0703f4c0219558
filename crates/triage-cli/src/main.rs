mod config;
mod curate;
mod display;
mod label;
mod retriage;
mod status;

use anyhow::{Context, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use triage_ai::Governor;
use triage_core::Curator;
use triage_store::{Ledger, load_source};

use crate::config::{Cli, Command};
use crate::display::TriageCard;
use crate::label::{LabelSettings, run_label_pipeline};
use crate::retriage::TypedRequest;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("triage v{}", env!("CARGO_PKG_VERSION"));

    let ledger = Ledger::new(&cli.snapshot, &cli.log, cli.on_ledger_corrupt.into());
    let read_source = || {
        load_source(&cli.source).with_context(|| format!("loading {}", cli.source.display()))
    };

    match cli.command {
        Command::Label(args) => {
            let governor = Governor::new(args.min_interval_secs, args.max_calls)?;
            let records = read_source()?;
            let client = args.model.client()?;
            let settings = LabelSettings {
                batch_size: args.batch_size,
                strict: args.strict,
            };

            let report = run_label_pipeline(&records, &ledger, &client, &governor, settings).await?;
            display::print_run_report(&report);
            if !report.failures.is_empty() {
                bail!(
                    "{} of {} attempted batches failed",
                    report.failures.len(),
                    report.calls_made
                );
            }
        }
        Command::Curate(args) => {
            let curator = Curator::new(args.count, args.seed)?;
            let records = read_source()?;
            let summary = curate::run_curation(&records, &ledger, &cli.demo, &curator)?;
            display::print_curation_summary(&summary);
        }
        Command::Retriage(args) => {
            if args.list {
                display::print_example_list(&retriage::list_examples(&cli.demo)?);
                return Ok(());
            }
            if let Some(id) = args.example {
                let example = retriage::lookup_example(&cli.demo, id)?;
                display::print_card(&TriageCard::from_example(&example));
                return Ok(());
            }

            let request = TypedRequest {
                comment: args.comment.unwrap_or_default(),
                priority: args.priority,
                category: args.category,
            };
            let allowed = retriage::allowed_for_retriage(&ledger, &cli.demo)?;
            let client = args.model.client()?;
            let (item, label) =
                retriage::retriage_request(&client, &request, allowed, chrono::Local::now())
                    .await?;
            display::print_card(&TriageCard::from_request(&item, &label));
        }
        Command::Status(args) => {
            let records = read_source()?;
            let report = status::ledger_status(&records, &ledger, args.batch_size)?;
            display::print_status(&report);
        }
    }

    Ok(())
}
