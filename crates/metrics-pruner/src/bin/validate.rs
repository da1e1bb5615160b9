//! Checks that in-use metrics survive a metric drop rule change.

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::disallowed_macros)]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use metrics_pruner::backend::UNSIGNED_REQUESTS_WARNING;
use metrics_pruner::{ui, validate, validate_target, HttpMetricsBackend, Inventory, Mode, Outcome};

#[derive(Parser)]
#[command(name = "validate-metrics")]
#[command(about = "Validate that metric filtering did not drop metrics in use", long_about = None)]
#[command(version)]
struct Cli {
    /// AWS region
    region: String,

    /// AMP workspace ID
    workspace_id: String,

    /// 'before' or 'after' metrics filtering
    #[arg(value_enum)]
    mode: Mode,

    /// Query endpoint replacing the regional AMP host (e.g. a SigV4 proxy)
    #[arg(long, env = "AMP_QUERY_ENDPOINT")]
    endpoint: Option<String>,

    /// Directory holding the metric exports and the snapshot
    #[arg(long, default_value = ".")]
    dir: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        ui::print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    validate_target(&cli.region, &cli.workspace_id)?;
    if cli.endpoint.is_none() {
        ui::print_warning(UNSIGNED_REQUESTS_WARNING);
    }

    let inventory = Inventory::new(&cli.dir);
    let backend =
        HttpMetricsBackend::for_workspace(&cli.region, &cli.workspace_id, cli.endpoint.as_deref())?;

    let outcome = validate(&inventory, &backend, cli.mode).await?;

    let checked = match &outcome {
        Outcome::Recorded { checked, missing, .. } => {
            for metric in missing {
                ui::print_warning(&format!("Metric {metric} not found!"));
            }
            *checked
        }
        Outcome::Compared { checked, .. } => *checked,
    };
    ui::print_info(&format!("Number of inuse metrics: {checked}"));

    let summary = outcome.summary();
    if outcome.is_clean() {
        ui::print_success(&summary);
    } else {
        ui::print_warning(&summary);
    }

    if !outcome.failed().is_empty() {
        anyhow::bail!("Queries failed for {} metrics", outcome.failed().len());
    }
    Ok(())
}
