//! Upgrade plan generation.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::ai::prompts::create_handlebars;
use crate::ai::{ModelInvoker, PromptManager};
use crate::config::PlannerConfig;
use crate::entities::ClusterInfo;
use crate::errors::{PlannerError, PlannerResult};

use super::docs::{document_catalog, DocumentFetcher, ReferenceDocs};
use super::topics::TopicAnalyzer;
use super::versions::validate_versions;

/// Markdown layout of the final plan
const PLAN_TEMPLATE: &str = "# 集群信息

{{ClusterSummary}}

# 升级前检查

## 特定版本变更检查及建议

{{ClusterVersion}}

## Kubelet和kube-proxy版本对齐

{{KubernetesSkew}}

## 插件版本兼容性检查及建议

{{Addons}}

## Kubernetes API version与目标EKS版本的兼容性检查（若有）

{{APIVersion}}

## 集群健康检查及修复建议（若有）

{{ClusterHealth}}

# 控制面升级

{{ControlPlane}}

# 插件升级（更新建议）

{{AddonUpgrade}}

# 数据面升级

{{NodegroupUpgrade}}

# 测试验证

{{Test}}";

/// Text of every plan section.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlanSections {
    pub cluster_summary: String,
    pub cluster_version: String,
    pub kubernetes_skew: String,
    pub addons: String,
    #[serde(rename = "APIVersion")]
    pub api_version: String,
    pub cluster_health: String,
    pub control_plane: String,
    pub addon_upgrade: String,
    pub nodegroup_upgrade: String,
    pub test: String,
}

impl PlanSections {
    /// Assemble the Markdown document.
    pub fn render(&self) -> PlannerResult<String> {
        create_handlebars()
            .render_template(PLAN_TEMPLATE, self)
            .map_err(|e| PlannerError::Template {
                template: "upgrade-plan".to_string(),
                reason: e.to_string(),
            })
    }
}

/// Write a generated plan to `path`.
pub fn save_plan(path: &Path, plan: &str) -> PlannerResult<()> {
    std::fs::write(path, plan).map_err(|e| PlannerError::FileWrite {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Builds upgrade plans.
pub struct PlannerDomain {
    invoker: ModelInvoker,
    fetcher: Arc<dyn DocumentFetcher>,
    prompts: PromptManager,
    config: PlannerConfig,
}

impl PlannerDomain {
    pub fn new(invoker: ModelInvoker, fetcher: Arc<dyn DocumentFetcher>, config: PlannerConfig) -> Self {
        Self {
            invoker,
            fetcher,
            prompts: PromptManager::new(),
            config,
        }
    }

    /// Generate the plan for `info` using `model_id`.
    ///
    /// Fails before any document fetch or model call when the current version
    /// is missing or the version pair is invalid. Model failures do not fail
    /// the plan; they appear as text in the affected sections.
    pub async fn generate(&self, info: &ClusterInfo, model_id: &str) -> PlannerResult<String> {
        let current_version = info
            .current_version()
            .ok_or(PlannerError::IncompleteClusterInfo)?;
        let target_version = info.target_version.trim();

        let check = validate_versions(current_version, target_version);
        if !check.valid {
            return Err(PlannerError::VersionValidation {
                reason: check.error,
            });
        }
        info!(
            cluster = %info.cluster_name,
            current_version,
            target_version,
            steps = ?check.versions,
            "Generating upgrade plan"
        );

        let catalog = document_catalog(&self.config.docs);
        let docs = ReferenceDocs::fetch_all(self.fetcher.as_ref(), &catalog).await;

        let topics = TopicAnalyzer::new(
            &self.invoker,
            &self.prompts,
            &docs,
            model_id,
            info,
            current_version,
            target_version,
        );

        let kubernetes_skew = topics.version_skew().await?;
        let cluster_summary = topics.cluster_summary(&kubernetes_skew).await?;
        let cluster_health = topics.cluster_health().await?;
        let addons = topics.addon_compatibility().await?;
        let cluster_version = topics.version_changes().await?;
        let api_version = topics.deprecated_apis().await?;
        let control_plane = topics.control_plane().await?;
        let addon_upgrade = topics.addon_upgrade().await?;
        let nodegroup_upgrade = topics.nodegroups().await?;
        let test = topics.test_validation().await?;

        PlanSections {
            cluster_summary,
            cluster_version,
            kubernetes_skew,
            addons,
            api_version,
            cluster_health,
            control_plane,
            addon_upgrade,
            nodegroup_upgrade,
            test,
        }
        .render()
    }
}
