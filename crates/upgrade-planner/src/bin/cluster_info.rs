//! EKS cluster information CLI.
//!
//! Collects the facts the upgrade planner consumes and writes them as JSON.

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::disallowed_macros)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use upgrade_planner::collector::eks::require_region;
use upgrade_planner::collector::{
    collect_cluster_info, ClusterInspector, CollectRequest, EksCollector, KubeInspector,
};
use upgrade_planner::ui;

#[derive(Parser)]
#[command(name = "eks-cluster-info")]
#[command(about = "EKS Cluster Information Tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Name of the EKS cluster
    cluster_name: String,

    /// Target EKS version for compatibility checks
    target_version: String,

    /// AWS region of the EKS cluster
    #[arg(long)]
    region: Option<String>,

    /// AWS profile to use
    #[arg(long)]
    profile: Option<String>,

    /// Connect to Kubernetes API server to collect additional information
    #[arg(long)]
    connect_k8s: bool,

    /// Output file path to save cluster information as JSON
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Err(e) = run(cli).await {
        ui::print_error(&format!("Error: {e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let region = require_region(cli.region.as_deref(), cli.profile.as_deref()).await?;

    let eks = EksCollector::connect(&region, cli.profile.as_deref()).await;

    let inspector = if cli.connect_k8s {
        let inspector = KubeInspector::connect()
            .await
            .context("Failed to connect to kube-apiserver!")?;
        Some(inspector)
    } else {
        None
    };

    let request = CollectRequest {
        cluster_name: cli.cluster_name,
        region,
        target_version: cli.target_version,
        enforce_target_window: true,
    };
    let info = collect_cluster_info(
        &eks,
        inspector.as_ref().map(|i| i as &dyn ClusterInspector),
        &request,
    )
    .await?;

    eprint!("{}", ui::cluster_report(&info, cli.connect_k8s));

    match cli.output_file {
        Some(path) => {
            info.save(&path)?;
            ui::print_success(&format!("Cluster information saved to {}", path.display()));
        }
        None => println!("{}", serde_json::to_string_pretty(&info)?),
    }
    Ok(())
}
