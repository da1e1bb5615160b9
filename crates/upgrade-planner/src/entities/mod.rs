//! Cluster fact data structures.
//!
//! These types mirror the cluster-info JSON document written by
//! `eks-cluster-info` and consumed by `eks-upgrade-planner --cluster-info-file`.

mod addon;
mod cluster;
mod insight;

pub use addon::{AddonUpgradeInfo, ComponentVersion, InstalledAddon, OpenSourceAddon};
pub use cluster::{ClusterInfo, HealthIssue, NodegroupInfo};
pub use insight::{
    addon_compatibility_issues, deprecated_api_versions, AddonCompatibilityDetail,
    AddonCompatibilityIssue, CategorySummary, ClientStat, CompatibilityIssue, DeprecatedApi,
    InsightResource, InsightStatus, ADDON_COMPATIBILITY_INSIGHT, DEPRECATED_API_INSIGHT_PREFIX,
};
