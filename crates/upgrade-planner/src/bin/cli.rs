//! EKS upgrade planner CLI.

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::disallowed_macros)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use upgrade_planner::ai::{BedrockRuntime, DEFAULT_BEDROCK_REGION};
use upgrade_planner::collector::eks::require_region;
use upgrade_planner::collector::{
    collect_cluster_info, ClusterInspector, CollectRequest, EksCollector, KubeInspector,
};
use upgrade_planner::domain::{save_plan, HttpDocumentFetcher};
use upgrade_planner::{ui, ClusterInfo, ModelInvoker, PlannerConfig, PlannerDomain};

/// Default Bedrock model
const DEFAULT_MODEL_ID: &str = "us.deepseek.r1-v1:0";

#[derive(Parser)]
#[command(name = "eks-upgrade-planner")]
#[command(about = "EKS集群升级规划工具", long_about = None)]
#[command(version)]
struct Cli {
    /// EKS集群名称（与--cluster-info-file互斥）
    #[arg(
        required_unless_present = "cluster_info_file",
        conflicts_with = "cluster_info_file"
    )]
    cluster_name: Option<String>,

    /// 目标EKS版本（与--cluster-info-file互斥）
    #[arg(
        required_unless_present = "cluster_info_file",
        conflicts_with = "cluster_info_file"
    )]
    target_version: Option<String>,

    /// 包含集群信息的JSON文件路径
    #[arg(long)]
    cluster_info_file: Option<PathBuf>,

    /// EKS集群所在的AWS区域
    #[arg(long)]
    region: Option<String>,

    /// AWS配置文件
    #[arg(long)]
    profile: Option<String>,

    /// 连接到Kubernetes API服务器以收集额外信息（与--cluster-info-file互斥）
    #[arg(long, conflicts_with = "cluster_info_file")]
    connect_k8s: bool,

    /// AWS Bedrock服务区域
    #[arg(long, default_value = DEFAULT_BEDROCK_REGION)]
    bedrock_region: String,

    /// Bedrock模型ID
    #[arg(long, default_value = DEFAULT_MODEL_ID)]
    model_id: String,

    /// 用于调用Bedrock API的IAM角色ARN
    #[arg(long)]
    role_arn: Option<String>,

    /// 输出文件路径
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 启用调试模式，打印请求和响应详情
    #[arg(long)]
    debug: bool,

    /// Planner configuration file (TOML)
    #[arg(long, env = "EKS_UPGRADE_PLANNER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Err(e) = run(cli).await {
        ui::print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn load_cluster_info(cli: &Cli) -> Result<ClusterInfo> {
    if let Some(path) = &cli.cluster_info_file {
        info!(path = %path.display(), "Loading cluster information from file");
        return Ok(ClusterInfo::from_file(path)?);
    }

    // clap guarantees both positionals without --cluster-info-file
    let (Some(cluster_name), Some(target_version)) = (&cli.cluster_name, &cli.target_version)
    else {
        anyhow::bail!("当不提供--cluster-info-file参数时，必须提供cluster_name和target_version参数");
    };

    let region = require_region(cli.region.as_deref(), cli.profile.as_deref()).await?;

    let eks = EksCollector::connect(&region, cli.profile.as_deref()).await;

    let inspector = if cli.connect_k8s {
        match KubeInspector::connect().await {
            Ok(inspector) => Some(inspector),
            Err(e) => {
                warn!(error = %e, "Failed to connect to kube-apiserver, continuing without in-cluster facts");
                ui::print_warning("无法连接到Kubernetes API服务器，将仅使用EKS API信息");
                None
            }
        }
    } else {
        None
    };

    let request = CollectRequest {
        cluster_name: cluster_name.clone(),
        region,
        target_version: target_version.clone(),
        enforce_target_window: false,
    };
    let info = collect_cluster_info(
        &eks,
        inspector.as_ref().map(|i| i as &dyn ClusterInspector),
        &request,
    )
    .await?;
    Ok(info)
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = PlannerConfig::load_or_default(cli.config.as_deref())?;
    config.invoker = config.invoker.with_debug(cli.debug);

    let cluster_info = load_cluster_info(&cli).await?;

    let runtime = BedrockRuntime::connect(&cli.bedrock_region, cli.role_arn.as_deref()).await;
    let invoker = ModelInvoker::new(Arc::new(runtime), config.invoker.clone());
    let fetcher = HttpDocumentFetcher::new()?;
    let domain = PlannerDomain::new(invoker, Arc::new(fetcher), config);

    let plan = domain.generate(&cluster_info, &cli.model_id).await?;

    match &cli.output {
        Some(path) => {
            save_plan(path, &plan)?;
            ui::print_success(&format!("升级计划已保存到: {}", path.display()));
        }
        None => println!("{plan}"),
    }
    Ok(())
}
