//! Lists ingested metrics that no dashboard or rule uses, grouped by job.

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::disallowed_macros)]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use metrics_pruner::backend::UNSIGNED_REQUESTS_WARNING;
use metrics_pruner::{extract_unused, ui, validate_target, HttpMetricsBackend, Inventory};

#[derive(Parser)]
#[command(name = "extract-unused-metrics")]
#[command(about = "Find ingested metrics that are not used by dashboards or rules", long_about = None)]
#[command(version)]
struct Cli {
    /// AWS region of the workspace
    #[arg(long, env = "TF_VAR_aws_region")]
    region: String,

    /// AMP workspace ID
    #[arg(long, env = "AMP_WP_ID")]
    workspace_id: String,

    /// Query endpoint replacing the regional AMP host (e.g. a SigV4 proxy)
    #[arg(long, env = "AMP_QUERY_ENDPOINT")]
    endpoint: Option<String>,

    /// Directory holding the metric exports
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

    let extraction = extract_unused(&inventory, &backend).await?;

    ui::print_info(&format!("Number of inuse metrics: {}", extraction.in_use));
    ui::print_info(&format!("Number of ingested metrics: {}", extraction.ingested));
    ui::print_info(&format!("Number of unused metrics: {}", extraction.unused));
    for metric in &extraction.labels.rejected {
        ui::print_warning(&format!("Invalid metric name {metric}. Skipping."));
    }
    for metric in &extraction.labels.not_found {
        ui::print_warning(&format!("Metric {metric} not found!"));
    }

    println!("Metrics to drop:");
    print!("{}", extraction.report());

    let failed = &extraction.labels.failed;
    if !failed.is_empty() {
        anyhow::bail!(
            "Queries failed for {} metrics, they are not listed above: {}",
            failed.len(),
            failed.join(", ")
        );
    }
    Ok(())
}
