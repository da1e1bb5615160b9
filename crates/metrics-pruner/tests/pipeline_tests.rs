//! End-to-end tests for extraction and validation against a mock workspace.

use metrics_pruner::backend::HttpMetricsBackend;
use metrics_pruner::extract::UNKNOWN_JOB;
use metrics_pruner::inventory::{
    ALL_METRICS_FILE, GRAFANA_METRICS_FILE, RULER_METRICS_FILE, SNAPSHOT_FILE,
};
use metrics_pruner::{extract_unused, validate, Inventory, MetricsBackend, Mode, Outcome, PrunerError};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WORKSPACE_PATH: &str = "/workspaces/ws-abc/api/v1/query";

fn inventory_dir(grafana: &[&str], ruler: &[&str], ingested: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(GRAFANA_METRICS_FILE),
        json!({ "metricsUsed": grafana }).to_string(),
    )
    .unwrap();
    std::fs::write(
        dir.path().join(RULER_METRICS_FILE),
        json!({ "metricsUsed": ruler }).to_string(),
    )
    .unwrap();
    std::fs::write(
        dir.path().join(ALL_METRICS_FILE),
        json!({ "status": "success", "data": ingested }).to_string(),
    )
    .unwrap();
    dir
}

fn vector(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "status": "success",
        "data": { "resultType": "vector", "result": result }
    }))
}

fn absent() -> ResponseTemplate {
    vector(json!([{ "metric": {}, "value": [1_700_000_000.0, "1"] }]))
}

/// `query=` form field for `promql`, as reqwest encodes it.
fn form_query(promql: &str) -> String {
    let mut encoded = String::from("query=");
    for byte in promql.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'*' | b'-' | b'.' | b'_' => {
                encoded.push(byte as char);
            }
            b' ' => encoded.push('+'),
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

async fn backend(server: &MockServer) -> HttpMetricsBackend {
    HttpMetricsBackend::for_workspace("us-east-1", "ws-abc", Some(&server.uri())).unwrap()
}

mod backend_tests {
    use super::*;

    #[tokio::test]
    async fn test_query_is_posted_as_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(WORKSPACE_PATH))
            .and(body_string_contains(form_query("sum(up) by (job)")))
            .respond_with(vector(json!([{ "metric": { "job": "node" }, "value": [1.0, "3"] }])))
            .expect(1)
            .mount(&server)
            .await;

        let response = backend(&server).await.query("sum(up) by (job)").await.unwrap();
        assert_eq!(response.data.result.len(), 1);
        assert_eq!(response.data.result[0].value_text(), Some("3"));
    }

    #[tokio::test]
    async fn test_server_error_is_a_query_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = backend(&server).await.query("up").await.unwrap_err();
        assert!(matches!(err, PrunerError::Query { ref query, .. } if query == "up"));
    }
}

mod extract_tests {
    use super::*;

    #[tokio::test]
    async fn test_unused_metrics_are_labelled_by_job() {
        let dir = inventory_dir(
            &["http_latency_bucket", "up"],
            &["up"],
            &[
                "http_latency_bucket",
                "http_latency_count",
                "http_latency_sum",
                "up",
                "go_goroutines",
                "node_load1",
                "process_open_fds",
                "kube_pod_info",
            ],
        );

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains(form_query("sum(go_goroutines) by (job)")))
            .respond_with(vector(json!([
                { "metric": { "job": "apiserver" }, "value": [1.0, "10"] },
                { "metric": { "job": "kubelet" }, "value": [1.0, "20"] }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains(form_query("sum(node_load1) by (job)")))
            .respond_with(vector(json!([{ "metric": {}, "value": [1.0, "2"] }])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains(form_query("sum(process_open_fds) by (job)")))
            .respond_with(vector(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains(form_query("sum(kube_pod_info) by (job)")))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let extraction = extract_unused(&Inventory::new(dir.path()), &backend(&server).await)
            .await
            .unwrap();

        assert_eq!(extraction.in_use, 4);
        assert_eq!(extraction.ingested, 8);
        assert_eq!(extraction.unused, 4);
        assert_eq!(extraction.labels.not_found, vec!["process_open_fds"]);
        assert_eq!(extraction.labels.failed, vec!["kube_pod_info"]);
        assert!(extraction.labels.rejected.is_empty());
        assert_eq!(
            extraction.report(),
            format!("Job: {UNKNOWN_JOB}\nnode_load1\nJob: apiserver\ngo_goroutines\nJob: kubelet\ngo_goroutines\n")
        );
    }

    #[tokio::test]
    async fn test_invalid_names_are_never_queried() {
        let dir = inventory_dir(&[], &[], &["up{job=\"x\"}", "node_load1"]);

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains(form_query("sum(node_load1) by (job)")))
            .respond_with(vector(json!([{ "metric": { "job": "node" }, "value": [1.0, "1"] }])))
            .expect(1)
            .mount(&server)
            .await;

        let extraction = extract_unused(&Inventory::new(dir.path()), &backend(&server).await)
            .await
            .unwrap();

        assert_eq!(extraction.labels.rejected, vec!["up{job=\"x\"}"]);
        assert_eq!(extraction.report(), "Job: node\nnode_load1\n");
    }

    #[tokio::test]
    async fn test_missing_inventory_file_fails() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;

        let err = extract_unused(&Inventory::new(dir.path()), &backend(&server).await)
            .await
            .unwrap_err();
        assert!(matches!(err, PrunerError::InventoryRead { .. }));
    }
}

mod validate_tests {
    use super::*;

    #[tokio::test]
    async fn test_before_writes_snapshot() {
        let dir = inventory_dir(&["up", "legacy_metric"], &[], &[]);

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains(form_query("absent_over_time(legacy_metric[5m])")))
            .respond_with(absent())
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains(form_query("absent_over_time(up[5m])")))
            .respond_with(vector(json!([])))
            .mount(&server)
            .await;

        let inventory = Inventory::new(dir.path());
        let outcome = validate(&inventory, &backend(&server).await, Mode::Before)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Recorded {
                checked: 2,
                missing: vec!["legacy_metric".to_string()],
                failed: vec![],
            }
        );
        let snapshot: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(SNAPSHOT_FILE)).unwrap())
                .unwrap();
        assert_eq!(snapshot, vec!["legacy_metric"]);
    }

    #[tokio::test]
    async fn test_after_reports_newly_missing() {
        let dir = inventory_dir(&["up", "legacy_metric"], &["node_load1"], &[]);
        std::fs::write(dir.path().join(SNAPSHOT_FILE), r#"["legacy_metric"]"#).unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains(form_query("absent_over_time(legacy_metric[5m])")))
            .respond_with(absent())
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains(form_query("absent_over_time(node_load1[5m])")))
            .respond_with(absent())
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains(form_query("absent_over_time(up[5m])")))
            .respond_with(vector(json!([])))
            .mount(&server)
            .await;

        let outcome = validate(&Inventory::new(dir.path()), &backend(&server).await, Mode::After)
            .await
            .unwrap();

        assert!(!outcome.is_clean());
        assert_eq!(
            outcome.summary(),
            "There are total 1 metrics missing after metrics filtering!\nMissing metrics:\nnode_load1"
        );
    }

    #[tokio::test]
    async fn test_after_without_snapshot_sends_no_queries() {
        let dir = inventory_dir(&["up"], &[], &[]);

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(absent())
            .expect(0)
            .mount(&server)
            .await;

        let err = validate(&Inventory::new(dir.path()), &backend(&server).await, Mode::After)
            .await
            .unwrap_err();
        assert!(matches!(err, PrunerError::SnapshotRead { .. }));
    }

    #[tokio::test]
    async fn test_rejected_queries_keep_previous_snapshot() {
        let dir = inventory_dir(&["up", "node_load1", "kube_pod_info"], &[], &[]);
        std::fs::write(dir.path().join(SNAPSHOT_FILE), r#"["legacy_metric"]"#).unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(WORKSPACE_PATH))
            .respond_with(ResponseTemplate::new(403))
            .expect(3)
            .mount(&server)
            .await;

        let outcome = validate(&Inventory::new(dir.path()), &backend(&server).await, Mode::Before)
            .await
            .unwrap();

        assert!(!outcome.is_clean());
        assert_eq!(outcome.failed(), ["kube_pod_info", "node_load1", "up"]);
        assert!(!outcome.summary().contains("Congratulations"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join(SNAPSHOT_FILE)).unwrap(),
            r#"["legacy_metric"]"#
        );
    }

    #[tokio::test]
    async fn test_failed_queries_are_reported_after_filtering() {
        let dir = inventory_dir(&["up", "node_load1"], &[], &[]);
        std::fs::write(dir.path().join(SNAPSHOT_FILE), "[]").unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains(form_query("absent_over_time(up[5m])")))
            .respond_with(vector(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains(form_query("absent_over_time(node_load1[5m])")))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let outcome = validate(&Inventory::new(dir.path()), &backend(&server).await, Mode::After)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Compared {
                checked: 2,
                newly_missing: vec![],
                failed: vec!["node_load1".to_string()],
            }
        );
        assert!(!outcome.is_clean());
    }
}
