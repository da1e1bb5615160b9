//! Cluster fact collection.
//!
//! Facts come from two places: the EKS control plane API (always) and the
//! Kubernetes API server (only with `--connect-k8s`). Both sources sit
//! behind traits so collection logic can run against fakes.

pub mod analysis;
pub mod eks;
pub mod k8s;

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::entities::{
    addon_compatibility_issues, deprecated_api_versions, AddonUpgradeInfo, ClusterInfo,
    CompatibilityIssue, ComponentVersion, HealthIssue, InstalledAddon, NodegroupInfo,
    OpenSourceAddon,
};
use crate::errors::{PlannerError, PlannerResult};

pub use self::eks::EksCollector;
pub use self::k8s::KubeInspector;
use analysis::{
    assess_addon, check_version_skew, kubernetes_versions_between, min_version, parse_loose,
    validate_target_version,
};

/// Regions where the Cluster Insights API is unavailable
const INSIGHTS_UNSUPPORTED_REGIONS: &[&str] = &["cn-north-1", "cn-northwest-1"];

/// Whether the Cluster Insights API can be used in `region`.
pub fn insights_supported(region: &str) -> bool {
    !INSIGHTS_UNSUPPORTED_REGIONS.contains(&region)
}

/// Control plane version and health of a cluster.
#[derive(Debug, Clone, Default)]
pub struct ClusterDescription {
    pub version: String,
    pub health_issues: Vec<HealthIssue>,
}

/// Facts available from the EKS API.
#[async_trait]
pub trait ClusterFactCollector: Send + Sync {
    async fn describe_cluster(&self, cluster: &str) -> PlannerResult<ClusterDescription>;

    /// Upgrade-readiness insights with their details.
    async fn upgrade_insights(&self, cluster: &str) -> PlannerResult<Vec<CompatibilityIssue>>;

    async fn nodegroups(&self, cluster: &str) -> PlannerResult<Vec<NodegroupInfo>>;

    async fn fargate_profiles(&self, cluster: &str) -> PlannerResult<Vec<String>>;

    async fn installed_addons(&self, cluster: &str) -> PlannerResult<Vec<InstalledAddon>>;

    /// Add-on versions that list compatibilities for `kubernetes_version`.
    async fn addon_versions(&self, addon: &str, kubernetes_version: &str)
        -> PlannerResult<Vec<String>>;
}

/// Self-managed and Karpenter node versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeVersions {
    pub min_self_managed_version: Option<String>,
    pub min_karpenter_version: Option<String>,
    pub self_managed_count: u32,
    pub karpenter_count: u32,
}

/// Facts available from inside the cluster.
#[async_trait]
pub trait ClusterInspector: Send + Sync {
    async fn node_versions(&self) -> PlannerResult<NodeVersions>;

    /// Known open source add-ons that are not installed as EKS add-ons.
    async fn opensource_addons(&self, installed: &[InstalledAddon]) -> Vec<OpenSourceAddon>;

    /// coredns, kube-proxy and vpc-cni versions when not installed as EKS add-ons.
    async fn core_components(&self, installed: &[InstalledAddon]) -> Vec<ComponentVersion>;
}

/// What to collect.
#[derive(Debug, Clone)]
pub struct CollectRequest {
    pub cluster_name: String,
    pub region: String,
    pub target_version: String,
    /// Reject targets outside the supported upgrade window before collecting
    pub enforce_target_window: bool,
}

/// Compatibility of every installed add-on along the upgrade path.
///
/// The boolean is false when any add-on lacks a usable version.
pub async fn addon_upgrade_info(
    eks: &dyn ClusterFactCollector,
    installed: &[InstalledAddon],
    current_version: &str,
    target_version: &str,
) -> (Vec<AddonUpgradeInfo>, bool) {
    let (Some(current), Some(target)) = (parse_loose(current_version), parse_loose(target_version))
    else {
        warn!(current_version, target_version, "Cannot compute add-on upgrade path");
        return (Vec::new(), false);
    };
    let path = kubernetes_versions_between(current, target);

    let mut upgrade_recommended = true;
    let mut results = Vec::with_capacity(installed.len());

    'addons: for addon in installed {
        let mut compatible = BTreeMap::new();
        for kubernetes_version in &path {
            match eks.addon_versions(&addon.name, kubernetes_version).await {
                Ok(versions) => {
                    compatible.insert(kubernetes_version.clone(), versions);
                }
                Err(e) => {
                    warn!(addon = %addon.name, error = %e, "Failed to check add-on compatibility");
                    upgrade_recommended = false;
                    results.push(AddonUpgradeInfo {
                        name: addon.name.clone(),
                        current_version: addon.version.clone(),
                        status: format!("Error checking compatibility: {e}"),
                        ..AddonUpgradeInfo::default()
                    });
                    continue 'addons;
                }
            }
        }

        let (info, ok) = assess_addon(&addon.name, &addon.version, target_version, compatible);
        upgrade_recommended &= ok;
        results.push(info);
    }

    (results, upgrade_recommended)
}

/// Collect every fact about a cluster.
///
/// Only a failure to describe the cluster (or an out-of-window target when
/// enforced) is fatal; other lookups degrade to empty results with a warning.
pub async fn collect_cluster_info(
    eks: &dyn ClusterFactCollector,
    inspector: Option<&dyn ClusterInspector>,
    request: &CollectRequest,
) -> PlannerResult<ClusterInfo> {
    let cluster = request.cluster_name.as_str();
    info!(cluster, region = %request.region, "Collecting cluster information");

    let description = eks.describe_cluster(cluster).await?;
    let current_version = description.version.clone();

    if request.enforce_target_window {
        validate_target_version(&current_version, &request.target_version)
            .map_err(|reason| PlannerError::VersionValidation { reason })?;
    }

    let mut info = ClusterInfo {
        cluster_name: request.cluster_name.clone(),
        region: request.region.clone(),
        current_version: Some(current_version.clone()),
        target_version: request.target_version.clone(),
        timestamp: Some(chrono::Utc::now().to_rfc3339()),
        health_issues: description.health_issues,
        ..ClusterInfo::default()
    };

    if insights_supported(&request.region) {
        info.compatibility_issues = eks.upgrade_insights(cluster).await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to list cluster insights");
            Vec::new()
        });
        info.deprecated_apis = deprecated_api_versions(&info.compatibility_issues);
        info.addon_compatibility_issues = addon_compatibility_issues(&info.compatibility_issues);
    } else {
        info!(region = %request.region, "Cluster insights are not available in this region");
    }

    info.nodegroups = eks.nodegroups(cluster).await.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to list node groups");
        Vec::new()
    });
    info.min_nodegroup_version =
        min_version(info.nodegroups.iter().map(|ng| ng.version.as_str())).map(str::to_string);

    info.fargate_profiles = eks.fargate_profiles(cluster).await.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to list Fargate profiles");
        Vec::new()
    });

    info.installed_addons = eks.installed_addons(cluster).await.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to list installed add-ons");
        Vec::new()
    });

    let (upgrade_info, upgrade_recommended) = addon_upgrade_info(
        eks,
        &info.installed_addons,
        &current_version,
        &request.target_version,
    )
    .await;
    info.kube_proxy_version = upgrade_info
        .iter()
        .find(|a| a.name == "kube-proxy")
        .map(|a| a.current_version.clone());
    info.addon_upgrade_info = upgrade_info;
    info.upgrade_recommended = upgrade_recommended;

    if let Some(inspector) = inspector {
        match inspector.node_versions().await {
            Ok(nodes) => {
                info.min_self_managed_version = nodes.min_self_managed_version;
                info.min_karpenter_version = nodes.min_karpenter_version;
                info.self_managed_count = nodes.self_managed_count;
                info.karpenter_count = nodes.karpenter_count;
            }
            Err(e) => warn!(error = %e, "Failed to read node versions"),
        }
        info.opensource_addons = inspector.opensource_addons(&info.installed_addons).await;
        info.core_components = inspector.core_components(&info.installed_addons).await;
    }

    if let (Some(kube_proxy), Some(min_nodegroup)) =
        (info.kube_proxy_version.as_deref(), info.min_nodegroup_version.as_deref())
    {
        if let Some(skew) = check_version_skew(
            &current_version,
            Some(min_nodegroup),
            Some(kube_proxy),
            &request.target_version,
        ) {
            info.version_skew_recommended = Some(skew.upgrade_recommended);
            info.version_skew_recommendations = skew.recommendations;
        }
    }

    Ok(info)
}
