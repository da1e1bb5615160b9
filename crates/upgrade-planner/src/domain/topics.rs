//! Per-topic analysis: prompt rendering, short-circuits and model calls.

use serde::Serialize;
use tracing::info;

use crate::ai::prompts::{
    ids, AddonCompatibilityContext, AddonUpgradeContext, ClusterHealthContext,
    ClusterSummaryContext, ControlPlaneContext, DeprecatedApisContext, NodegroupsContext,
    PromptManager, TestValidationContext, VersionChangesContext, VersionSkewContext,
};
use crate::ai::{ModelInvoker, PromptRequest};
use crate::entities::ClusterInfo;
use crate::errors::PlannerResult;

use super::docs::{keys, ReferenceDocs};

/// Returned instead of a model call when there are no health issues
pub const NO_HEALTH_ISSUES: &str = "集群没有健康问题。";
/// Returned instead of a model call when no add-on is incompatible
pub const NO_ADDON_COMPATIBILITY_ISSUES: &str = "集群没有插件兼容性问题。";
/// Returned instead of a model call when no deprecated API is in use
pub const NO_DEPRECATED_APIS: &str = "集群没有使用废弃的API。";
/// Returned instead of a model call when there is no data plane to upgrade
pub const NO_DATA_PLANE: &str = "集群没有节点组或Fargate配置文件。";

/// Runs topic analyses for one cluster against one model.
pub struct TopicAnalyzer<'a> {
    invoker: &'a ModelInvoker,
    prompts: &'a PromptManager,
    docs: &'a ReferenceDocs,
    model_id: &'a str,
    info: &'a ClusterInfo,
    current_version: &'a str,
    target_version: &'a str,
}

impl<'a> TopicAnalyzer<'a> {
    pub fn new(
        invoker: &'a ModelInvoker,
        prompts: &'a PromptManager,
        docs: &'a ReferenceDocs,
        model_id: &'a str,
        info: &'a ClusterInfo,
        current_version: &'a str,
        target_version: &'a str,
    ) -> Self {
        Self {
            invoker,
            prompts,
            docs,
            model_id,
            info,
            current_version,
            target_version,
        }
    }

    async fn analyze<T: Serialize + Sync>(
        &self,
        topic: &str,
        context: &T,
        activity: &str,
    ) -> PlannerResult<String> {
        let (system, user) = self.prompts.render(topic, context)?;
        info!(topic, "{activity}");
        let request = PromptRequest::new(
            topic,
            self.model_id,
            system,
            user,
            self.invoker.temperature(),
        );
        Ok(self.invoker.invoke(&request).await)
    }

    pub async fn version_skew(&self) -> PlannerResult<String> {
        let context = VersionSkewContext {
            current_version: self.current_version.to_string(),
            target_version: self.target_version.to_string(),
            self_managed_nodes: self.info.self_managed_summary(),
            karpenter_nodes: self.info.karpenter_summary(),
            nodegroups: self.info.nodegroups.clone(),
            kube_proxy: self.info.kube_proxy_summary(),
        };
        self.analyze(ids::VERSION_SKEW, &context, "Analyzing version skew")
            .await
    }

    pub async fn cluster_summary(&self, version_skew: &str) -> PlannerResult<String> {
        let context = ClusterSummaryContext {
            cluster_name: self.info.cluster_name.clone(),
            current_version: self.current_version.to_string(),
            target_version: self.target_version.to_string(),
            nodegroups: self.info.nodegroups.clone(),
            self_managed_nodes: self.info.self_managed_summary(),
            karpenter_nodes: self.info.karpenter_summary(),
            fargate_profiles: self.info.fargate_profiles.clone(),
            version_skew: Some(version_skew.to_string()),
            kube_proxy: self.info.kube_proxy_summary(),
        };
        self.analyze(ids::CLUSTER_SUMMARY, &context, "Generating upgrade overview")
            .await
    }

    pub async fn cluster_health(&self) -> PlannerResult<String> {
        if self.info.health_issues.is_empty() {
            return Ok(NO_HEALTH_ISSUES.to_string());
        }
        let context = ClusterHealthContext {
            troubleshooting: self.docs.get(keys::TROUBLESHOOTING),
            health_issues: self.info.health_issues.clone(),
        };
        self.analyze(ids::CLUSTER_HEALTH, &context, "Analyzing cluster health issues")
            .await
    }

    pub async fn addon_compatibility(&self) -> PlannerResult<String> {
        if self.info.addon_compatibility_issues.is_empty() {
            return Ok(NO_ADDON_COMPATIBILITY_ISSUES.to_string());
        }
        let context = AddonCompatibilityContext {
            update_addon: self.docs.get(keys::UPDATE_ADDON),
            issues: self.info.addon_compatibility_issues.clone(),
        };
        self.analyze(
            ids::ADDON_COMPATIBILITY,
            &context,
            "Analyzing add-on compatibility issues",
        )
        .await
    }

    pub async fn version_changes(&self) -> PlannerResult<String> {
        let context = VersionChangesContext {
            standard_versions: self.docs.get(keys::STANDARD_VERSIONS),
            extended_versions: self.docs.get(keys::EXTENDED_VERSIONS),
            current_version: self.current_version.to_string(),
            target_version: self.target_version.to_string(),
        };
        self.analyze(
            ids::VERSION_CHANGES,
            &context,
            "Analyzing version-specific changes",
        )
        .await
    }

    pub async fn deprecated_apis(&self) -> PlannerResult<String> {
        if self.info.deprecated_apis.is_empty() {
            return Ok(NO_DEPRECATED_APIS.to_string());
        }
        let context = DeprecatedApisContext {
            api_migration: self.docs.get(keys::API_MIGRATION),
            deprecated_apis: self.info.deprecated_apis.clone(),
        };
        self.analyze(ids::DEPRECATED_APIS, &context, "Analyzing deprecated APIs")
            .await
    }

    pub async fn control_plane(&self) -> PlannerResult<String> {
        let context = ControlPlaneContext {
            update_kubernetes: self.docs.get(keys::UPDATE_KUBERNETES),
            current_version: self.current_version.to_string(),
            target_version: self.target_version.to_string(),
        };
        self.analyze(ids::CONTROL_PLANE, &context, "Analyzing control plane upgrade")
            .await
    }

    pub async fn addon_upgrade(&self) -> PlannerResult<String> {
        let context = AddonUpgradeContext {
            eks_addons: self.info.installed_addons.clone(),
            opensource_addons: self.info.opensource_addons.clone(),
            core_components: self.info.core_components.clone(),
            current_version: self.current_version.to_string(),
            target_version: self.target_version.to_string(),
        };
        self.analyze(ids::ADDON_UPGRADE, &context, "Analyzing add-on upgrades")
            .await
    }

    pub async fn nodegroups(&self) -> PlannerResult<String> {
        let context = NodegroupsContext {
            update_nodegroup: self.docs.get(keys::UPDATE_NODEGROUP),
            nodegroups: self.info.nodegroups.clone(),
            fargate_profiles: self.info.fargate_profiles.clone(),
            self_managed_nodes: self.info.self_managed_summary(),
            karpenter_nodes: self.info.karpenter_summary(),
        };
        if context.is_empty() {
            return Ok(NO_DATA_PLANE.to_string());
        }
        self.analyze(ids::NODEGROUPS, &context, "Analyzing data plane upgrade")
            .await
    }

    pub async fn test_validation(&self) -> PlannerResult<String> {
        self.analyze(
            ids::TEST_VALIDATION,
            &TestValidationContext::default(),
            "Generating test recommendations",
        )
        .await
    }
}
