//! Error types for the upgrade planner.

use thiserror::Error;

/// Errors raised while collecting facts or building a plan.
///
/// Model invocation failures never show up here: the invoker turns them
/// into text embedded in the plan.
#[derive(Error, Debug, Clone)]
pub enum PlannerError {
    // Input errors
    #[error("读取集群信息文件时出错: {reason}")]
    ClusterInfoFile { path: String, reason: String },

    #[error("从文件中读取的集群信息不完整，缺少当前版本信息。")]
    IncompleteClusterInfo,

    #[error("版本验证失败: {reason}")]
    VersionValidation { reason: String },

    // Collection errors
    #[error("EKS API error during {operation}: {reason}")]
    Eks { operation: String, reason: String },

    #[error("Kubernetes API error: {reason}")]
    Kube { reason: String },

    #[error("Cluster '{name}' was not found")]
    ClusterNotFound { name: String },

    #[error("需要提供AWS区域。请使用--region参数或在AWS配置中设置。")]
    MissingRegion,

    // Configuration errors
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    // Template errors
    #[error("Template error in '{template}': {reason}")]
    Template { template: String, reason: String },

    // Network errors
    #[error("HTTP client error: {reason}")]
    Http { reason: String },

    // General errors
    #[error("Failed to write '{path}': {reason}")]
    FileWrite { path: String, reason: String },

    #[error("Failed to serialize JSON: {reason}")]
    Json { reason: String },
}

impl From<serde_json::Error> for PlannerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            reason: err.to_string(),
        }
    }
}

impl From<kube::Error> for PlannerError {
    fn from(err: kube::Error) -> Self {
        Self::Kube {
            reason: err.to_string(),
        }
    }
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_cluster_info_message() {
        let err = PlannerError::IncompleteClusterInfo;
        assert!(err.to_string().contains("缺少当前版本信息"));
    }

    #[test]
    fn test_version_validation_display() {
        let err = PlannerError::VersionValidation {
            reason: "目标版本必须大于当前版本".to_string(),
        };
        assert_eq!(err.to_string(), "版本验证失败: 目标版本必须大于当前版本");
    }

    #[test]
    fn test_missing_region_message() {
        assert!(PlannerError::MissingRegion.to_string().contains("--region"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: PlannerError = json_err.into();
        assert!(matches!(err, PlannerError::Json { .. }));
    }
}
