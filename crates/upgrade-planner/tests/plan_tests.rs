//! Integration tests for plan generation.
//!
//! The model runtime and the document source are replaced with in-process
//! fakes or a local HTTP server.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use upgrade_planner::ai::{ModelRuntime, RuntimeError};
use upgrade_planner::domain::docs::{keys, DEFAULT_DOCS, FETCH_FAILURE_PREFIX};
use upgrade_planner::domain::topics::{
    NO_ADDON_COMPATIBILITY_ISSUES, NO_DATA_PLANE, NO_DEPRECATED_APIS, NO_HEALTH_ISSUES,
};
use upgrade_planner::domain::{DocumentFetcher, HttpDocumentFetcher};
use upgrade_planner::entities::{HealthIssue, NodegroupInfo};
use upgrade_planner::{ClusterInfo, ModelInvoker, PlannerConfig, PlannerDomain, PlannerError};

/// Answers every call with `ANSWER-<n>` and keeps the request bodies.
#[derive(Default)]
struct CountingRuntime {
    calls: AtomicUsize,
    bodies: Mutex<Vec<Value>>,
}

#[async_trait]
impl ModelRuntime for CountingRuntime {
    async fn invoke_model(&self, _model_id: &str, body: &Value) -> Result<Value, RuntimeError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.bodies.lock().unwrap().push(body.clone());
        Ok(json!({"choices": [{"message": {"content": format!("ANSWER-{n}")}}]}))
    }
}

#[derive(Default)]
struct StaticFetcher {
    fetches: AtomicUsize,
}

#[async_trait]
impl DocumentFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String, String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(format!("reference from {url}"))
    }
}

fn cluster(current: Option<&str>, target: &str) -> ClusterInfo {
    ClusterInfo {
        cluster_name: "prod".to_string(),
        region: "us-west-2".to_string(),
        current_version: current.map(str::to_string),
        target_version: target.to_string(),
        ..ClusterInfo::default()
    }
}

fn domain(
    runtime: Arc<CountingRuntime>,
    fetcher: Arc<dyn DocumentFetcher>,
    config: PlannerConfig,
) -> PlannerDomain {
    let invoker = ModelInvoker::new(runtime, config.invoker.clone());
    PlannerDomain::new(invoker, fetcher, config)
}

mod validation_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_current_version_fails_before_any_call() {
        let runtime = Arc::new(CountingRuntime::default());
        let fetcher = Arc::new(StaticFetcher::default());
        let planner = domain(runtime.clone(), fetcher.clone(), PlannerConfig::default());

        let err = planner
            .generate(&cluster(None, "1.29"), "us.deepseek.r1-v1:0")
            .await
            .unwrap_err();

        assert!(matches!(err, PlannerError::IncompleteClusterInfo));
        assert_eq!(runtime.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_version_pair_fails_before_any_call() {
        let runtime = Arc::new(CountingRuntime::default());
        let fetcher = Arc::new(StaticFetcher::default());
        let planner = domain(runtime.clone(), fetcher.clone(), PlannerConfig::default());

        let err = planner
            .generate(&cluster(Some("1.29"), "1.28"), "us.deepseek.r1-v1:0")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "版本验证失败: 目标版本必须大于当前版本");
        assert_eq!(runtime.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 0);
    }
}

mod generation_tests {
    use super::*;

    #[tokio::test]
    async fn test_minimal_cluster_short_circuits() {
        let runtime = Arc::new(CountingRuntime::default());
        let fetcher = Arc::new(StaticFetcher::default());
        let planner = domain(runtime.clone(), fetcher.clone(), PlannerConfig::default());

        let plan = planner
            .generate(&cluster(Some("1.28"), "1.29"), "us.deepseek.r1-v1:0")
            .await
            .unwrap();

        // skew, summary, version changes, control plane, add-on upgrade, tests
        assert_eq!(runtime.calls.load(Ordering::SeqCst), 6);
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), DEFAULT_DOCS.len());

        assert!(plan.starts_with("# 集群信息\n\nANSWER-2\n"));
        assert!(plan.contains("## 特定版本变更检查及建议\n\nANSWER-3\n"));
        assert!(plan.contains("## Kubelet和kube-proxy版本对齐\n\nANSWER-1\n"));
        assert!(plan.contains(NO_ADDON_COMPATIBILITY_ISSUES));
        assert!(plan.contains(NO_DEPRECATED_APIS));
        assert!(plan.contains(NO_HEALTH_ISSUES));
        assert!(plan.contains("# 控制面升级\n\nANSWER-4\n"));
        assert!(plan.contains("# 插件升级（更新建议）\n\nANSWER-5\n"));
        assert!(plan.contains(&format!("# 数据面升级\n\n{NO_DATA_PLANE}\n")));
        assert!(plan.ends_with("# 测试验证\n\nANSWER-6"));
    }

    #[tokio::test]
    async fn test_issues_trigger_model_calls() {
        let runtime = Arc::new(CountingRuntime::default());
        let planner = domain(
            runtime.clone(),
            Arc::new(StaticFetcher::default()),
            PlannerConfig::default(),
        );

        let mut info = cluster(Some("1.28"), "1.29");
        info.health_issues = vec![HealthIssue {
            code: Some("Ec2SubnetNotFound".to_string()),
            message: Some("subnet-123 was deleted".to_string()),
            resource_ids: vec!["subnet-123".to_string()],
        }];
        info.nodegroups = vec![NodegroupInfo {
            name: "ng-a".to_string(),
            version: "1.28".to_string(),
        }];

        let plan = planner.generate(&info, "us.deepseek.r1-v1:0").await.unwrap();

        // health and node groups are now analysed too
        assert_eq!(runtime.calls.load(Ordering::SeqCst), 8);
        assert!(!plan.contains(NO_HEALTH_ISSUES));
        assert!(!plan.contains(NO_DATA_PLANE));

        let bodies = runtime.bodies.lock().unwrap();
        let health_prompt = bodies
            .iter()
            .map(|b| b["messages"][1]["content"].as_str().unwrap_or_default().to_string())
            .find(|content| content.contains("Ec2SubnetNotFound"));
        assert!(health_prompt.is_some());
    }

    #[tokio::test]
    async fn test_model_failure_becomes_section_text() {
        struct FailingRuntime;

        #[async_trait]
        impl ModelRuntime for FailingRuntime {
            async fn invoke_model(&self, _: &str, _: &Value) -> Result<Value, RuntimeError> {
                Err(RuntimeError::new("AccessDeniedException: no access"))
            }
        }

        let config = PlannerConfig::default();
        let invoker = ModelInvoker::new(Arc::new(FailingRuntime), config.invoker.clone());
        let planner = PlannerDomain::new(invoker, Arc::new(StaticFetcher::default()), config);

        let plan = planner
            .generate(&cluster(Some("1.28"), "1.29"), "us.deepseek.r1-v1:0")
            .await
            .unwrap();
        assert!(plan.ends_with("# 测试验证\n\n调用LLM失败: AccessDeniedException: no access"));
    }
}

mod document_tests {
    use super::*;

    async fn server_with_docs() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/update-cluster.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("UPGRADE STEPS"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.html"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_http_fetcher_returns_body() {
        let server = server_with_docs().await;
        let fetcher = HttpDocumentFetcher::new().unwrap();

        let text = fetcher
            .fetch(&format!("{}/update-cluster.html", server.uri()))
            .await
            .unwrap();
        assert_eq!(text, "UPGRADE STEPS");
    }

    #[tokio::test]
    async fn test_http_fetcher_rejects_error_status() {
        let server = server_with_docs().await;
        let fetcher = HttpDocumentFetcher::new().unwrap();

        let err = fetcher
            .fetch(&format!("{}/missing.html", server.uri()))
            .await
            .unwrap_err();
        assert!(err.contains("404"));
    }

    #[tokio::test]
    async fn test_documents_flow_into_prompts() {
        let server = server_with_docs().await;

        let docs: BTreeMap<String, String> = DEFAULT_DOCS
            .iter()
            .map(|(key, _)| ((*key).to_string(), format!("{}/missing.html", server.uri())))
            .chain([(
                keys::UPDATE_KUBERNETES.to_string(),
                format!("{}/update-cluster.html", server.uri()),
            )])
            .collect();
        let config = PlannerConfig {
            docs,
            ..PlannerConfig::default()
        };

        let runtime = Arc::new(CountingRuntime::default());
        let planner = domain(
            runtime.clone(),
            Arc::new(HttpDocumentFetcher::new().unwrap()),
            config,
        );
        planner
            .generate(&cluster(Some("1.28"), "1.29"), "us.deepseek.r1-v1:0")
            .await
            .unwrap();

        let bodies = runtime.bodies.lock().unwrap();
        let systems: Vec<String> = bodies
            .iter()
            .map(|b| b["messages"][0]["content"].as_str().unwrap_or_default().to_string())
            .collect();
        assert!(systems.iter().any(|s| s.contains("UPGRADE STEPS")));
        assert!(systems.iter().any(|s| s.contains(FETCH_FAILURE_PREFIX)));
    }
}
