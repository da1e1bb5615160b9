//! Upgrade-readiness insights reported by the EKS Cluster Insights API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Insight name that carries add-on compatibility findings.
pub const ADDON_COMPATIBILITY_INSIGHT: &str = "EKS add-on version compatibility";

/// Prefix of insight names that carry deprecated API findings.
pub const DEPRECATED_API_INSIGHT_PREFIX: &str = "Deprecated APIs removed in Kubernetes";

/// A detailed upgrade-readiness insight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityIssue {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default)]
    pub additional_info: BTreeMap<String, String>,
    #[serde(default)]
    pub resources: Vec<InsightResource>,
    #[serde(default)]
    pub category_specific_summary: CategorySummary,
}

/// A resource affected by an insight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_resource_uri: Option<String>,
    #[serde(default)]
    pub insight_status: InsightStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reason: String,
}

/// Category-specific part of an insight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    #[serde(default)]
    pub deprecation_details: Vec<DeprecatedApi>,
    #[serde(default)]
    pub addon_compatibility_details: Vec<AddonCompatibilityDetail>,
}

/// A deprecated API still being called.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecatedApi {
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub replaced_with: String,
    #[serde(default)]
    pub stop_serving_version: String,
    #[serde(default)]
    pub start_serving_replacement_version: String,
    #[serde(default)]
    pub client_stats: Vec<ClientStat>,
}

/// Who is calling a deprecated API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStat {
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub number_of_requests_last30_days: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_request_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonCompatibilityDetail {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub compatible_versions: Vec<String>,
}

/// An add-on flagged as incompatible with the next Kubernetes version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonCompatibilityIssue {
    pub name: String,
    pub status: String,
    pub reason: String,
}

impl CompatibilityIssue {
    /// Add-ons in `ERROR` state within the add-on compatibility insight.
    pub fn addon_issues(&self) -> Vec<AddonCompatibilityIssue> {
        if self.name != ADDON_COMPATIBILITY_INSIGHT {
            return Vec::new();
        }

        self.resources
            .iter()
            .filter(|r| r.insight_status.status == "ERROR")
            .map(|r| AddonCompatibilityIssue {
                name: r.arn.as_deref().map(addon_name_from_arn).unwrap_or_default(),
                status: r.insight_status.status.clone(),
                reason: r.insight_status.reason.clone(),
            })
            .collect()
    }

    fn is_deprecated_api_insight(&self) -> bool {
        self.name.starts_with(DEPRECATED_API_INSIGHT_PREFIX)
    }
}

/// Add-on name from an add-on ARN (`.../addon/<cluster>/<name>/<uuid>`).
fn addon_name_from_arn(arn: &str) -> String {
    let parts: Vec<&str> = arn.split('/').collect();
    if parts.len() >= 2 {
        parts[parts.len() - 2].to_string()
    } else {
        arn.to_string()
    }
}

/// All add-on compatibility issues across insights.
pub fn addon_compatibility_issues(issues: &[CompatibilityIssue]) -> Vec<AddonCompatibilityIssue> {
    issues.iter().flat_map(CompatibilityIssue::addon_issues).collect()
}

/// All deprecated API usages across insights.
pub fn deprecated_api_versions(issues: &[CompatibilityIssue]) -> Vec<DeprecatedApi> {
    issues
        .iter()
        .filter(|i| i.is_deprecated_api_insight())
        .flat_map(|i| i.category_specific_summary.deprecation_details.iter().cloned())
        .collect()
}
