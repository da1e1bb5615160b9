//! Cluster-level facts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{PlannerError, PlannerResult};

use super::addon::{AddonUpgradeInfo, ComponentVersion, InstalledAddon, OpenSourceAddon};
use super::insight::{AddonCompatibilityIssue, CompatibilityIssue, DeprecatedApi};

/// Everything the planner knows about a cluster.
///
/// Every field except `current_version` may be missing from a file; the
/// planner refuses to run without the current version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterInfo {
    #[serde(default)]
    pub cluster_name: String,

    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub current_version: Option<String>,

    #[serde(default)]
    pub target_version: String,

    /// When the facts were collected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default)]
    pub health_issues: Vec<HealthIssue>,

    #[serde(default)]
    pub compatibility_issues: Vec<CompatibilityIssue>,

    #[serde(default)]
    pub nodegroups: Vec<NodegroupInfo>,

    #[serde(default)]
    pub min_nodegroup_version: Option<String>,

    #[serde(default)]
    pub fargate_profiles: Vec<String>,

    #[serde(default)]
    pub installed_addons: Vec<InstalledAddon>,

    #[serde(default)]
    pub addon_upgrade_info: Vec<AddonUpgradeInfo>,

    #[serde(default)]
    pub upgrade_recommended: bool,

    #[serde(default)]
    pub kube_proxy_version: Option<String>,

    #[serde(default)]
    pub min_self_managed_version: Option<String>,

    #[serde(default)]
    pub min_karpenter_version: Option<String>,

    #[serde(default)]
    pub self_managed_count: u32,

    #[serde(default)]
    pub karpenter_count: u32,

    #[serde(default)]
    pub opensource_addons: Vec<OpenSourceAddon>,

    #[serde(default)]
    pub core_components: Vec<ComponentVersion>,

    #[serde(default)]
    pub deprecated_apis: Vec<DeprecatedApi>,

    #[serde(default)]
    pub addon_compatibility_issues: Vec<AddonCompatibilityIssue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_skew_recommended: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub version_skew_recommendations: Vec<String>,
}

/// A cluster health issue as reported by `DescribeCluster`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthIssue {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub resource_ids: Vec<String>,
}

/// A managed node group and its Kubernetes version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodegroupInfo {
    pub name: String,
    pub version: String,
}

impl ClusterInfo {
    /// Read a cluster-info JSON file.
    pub fn from_file(path: &Path) -> PlannerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PlannerError::ClusterInfoFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content).map_err(|e| match e {
            PlannerError::Json { reason } => PlannerError::ClusterInfoFile {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parse a cluster-info JSON document and check it is usable.
    pub fn from_json(content: &str) -> PlannerResult<Self> {
        let info: Self = serde_json::from_str(content)?;
        if info.current_version().is_none() {
            return Err(PlannerError::IncompleteClusterInfo);
        }
        Ok(info)
    }

    /// Write the facts as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> PlannerResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| PlannerError::FileWrite {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Current control plane version, if known and non-empty.
    pub fn current_version(&self) -> Option<&str> {
        self.current_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// kube-proxy version, falling back to the self-managed core components.
    pub fn effective_kube_proxy_version(&self) -> Option<&str> {
        self.kube_proxy_version.as_deref().or_else(|| {
            self.core_components
                .iter()
                .find(|c| c.name == "kube-proxy")
                .map(|c| c.version.as_str())
        })
    }

    /// `{"version", "count"}` summary of self-managed nodes, if any were seen.
    pub fn self_managed_summary(&self) -> Option<String> {
        self.min_self_managed_version.as_ref().map(|version| {
            serde_json::json!({ "version": version, "count": self.self_managed_count }).to_string()
        })
    }

    /// `{"version", "count"}` summary of Karpenter nodes, if any were seen.
    pub fn karpenter_summary(&self) -> Option<String> {
        self.min_karpenter_version.as_ref().map(|version| {
            serde_json::json!({ "version": version, "count": self.karpenter_count }).to_string()
        })
    }

    /// `{"version"}` summary of kube-proxy, if known.
    pub fn kube_proxy_summary(&self) -> Option<String> {
        self.effective_kube_proxy_version()
            .map(|version| serde_json::json!({ "version": version }).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_document() {
        let info = ClusterInfo::from_json(r#"{"current_version": "1.27"}"#).unwrap();
        assert_eq!(info.current_version(), Some("1.27"));
        assert!(info.nodegroups.is_empty());
        assert!(!info.upgrade_recommended);
    }

    #[test]
    fn test_missing_current_version() {
        let err = ClusterInfo::from_json(r#"{"cluster_name": "demo"}"#).unwrap_err();
        assert!(matches!(err, PlannerError::IncompleteClusterInfo));
    }

    #[test]
    fn test_blank_current_version_is_missing() {
        let err = ClusterInfo::from_json(r#"{"current_version": "  "}"#).unwrap_err();
        assert!(matches!(err, PlannerError::IncompleteClusterInfo));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let info = ClusterInfo::from_json(
            r#"{"current_version": "1.28", "extra": {"nested": true}, "self_managed_count": 2}"#,
        )
        .unwrap();
        assert_eq!(info.self_managed_count, 2);
    }

    #[test]
    fn test_kube_proxy_falls_back_to_core_components() {
        let info = ClusterInfo {
            current_version: Some("1.29".to_string()),
            core_components: vec![
                ComponentVersion {
                    name: "coredns".to_string(),
                    version: "1.11.1".to_string(),
                },
                ComponentVersion {
                    name: "kube-proxy".to_string(),
                    version: "1.29.0-minimal".to_string(),
                },
            ],
            ..ClusterInfo::default()
        };
        assert_eq!(info.effective_kube_proxy_version(), Some("1.29.0-minimal"));
        assert_eq!(
            info.kube_proxy_summary().as_deref(),
            Some(r#"{"version":"1.29.0-minimal"}"#)
        );
    }

    #[test]
    fn test_node_summaries_only_when_version_known() {
        let mut info = ClusterInfo {
            self_managed_count: 4,
            ..ClusterInfo::default()
        };
        assert!(info.self_managed_summary().is_none());

        info.min_self_managed_version = Some("v1.27.9-eks".to_string());
        let summary: serde_json::Value =
            serde_json::from_str(&info.self_managed_summary().unwrap()).unwrap();
        assert_eq!(summary["version"], "v1.27.9-eks");
        assert_eq!(summary["count"], 4);
        assert!(info.karpenter_summary().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cluster.json");
        let info = ClusterInfo::from_json(r#"{"cluster_name": "prod", "current_version": "1.29"}"#).unwrap();

        info.save(&path).unwrap();
        let loaded = ClusterInfo::from_file(&path).unwrap();
        assert_eq!(loaded.cluster_name, "prod");
        assert_eq!(loaded.current_version(), Some("1.29"));
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let info = ClusterInfo::from_json(r#"{"current_version": "1.29"}"#).unwrap();

        let err = info.save(&dir.path().join("missing").join("cluster.json")).unwrap_err();
        assert!(matches!(err, PlannerError::FileWrite { .. }));
    }

    #[test]
    fn test_from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cluster.json");
        std::fs::write(&path, "not json").unwrap();

        let err = ClusterInfo::from_file(&path).unwrap_err();
        match err {
            PlannerError::ClusterInfoFile { path: p, .. } => assert!(p.ends_with("cluster.json")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
