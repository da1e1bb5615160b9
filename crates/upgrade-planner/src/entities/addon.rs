//! Add-on and core component facts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An EKS managed add-on installed on the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledAddon {
    pub name: String,
    pub version: String,
}

/// Upgrade compatibility of one EKS add-on across the upgrade path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonUpgradeInfo {
    pub name: String,
    pub current_version: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_version_range: Option<String>,
    /// Compatible add-on versions per Kubernetes version
    #[serde(default)]
    pub compatible_versions: BTreeMap<String, Vec<String>>,
}

/// An open source add-on found running in the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenSourceAddon {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub helm_installed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm_chart_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm_chart_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm_app_version: Option<String>,
}

/// A self-managed core component (coredns, kube-proxy, vpc-cni).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentVersion {
    pub name: String,
    pub version: String,
}
