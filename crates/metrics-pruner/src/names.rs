//! Metric name rules and set arithmetic.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

/// Metric names safe to embed in a query (compiled once)
static METRIC_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

const HISTOGRAM_BUCKET_SUFFIX: &str = "_bucket";

fn metric_name_regex() -> &'static Regex {
    METRIC_NAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_:]+$").expect("Invalid regex pattern"))
}

/// Whether `metric` only uses letters, digits, underscores and colons.
pub fn is_valid_metric_name(metric: &str) -> bool {
    metric_name_regex().is_match(metric)
}

/// `_count` and `_sum` series belonging to a histogram `_bucket` series.
///
/// The base name is everything before the last underscore.
pub fn histogram_companions(metric: &str) -> Option<[String; 2]> {
    if !metric.ends_with(HISTOGRAM_BUCKET_SUFFIX) {
        return None;
    }
    let base = metric.rsplit_once('_').map_or(metric, |(base, _)| base);
    Some([format!("{base}_count"), format!("{base}_sum")])
}

/// Metrics in use, plus the companions of every histogram bucket.
pub fn in_use_closure<I, S>(metrics: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut closure = BTreeSet::new();
    for metric in metrics {
        let metric = metric.as_ref();
        if let Some(companions) = histogram_companions(metric) {
            closure.extend(companions);
        }
        closure.insert(metric.to_string());
    }
    closure
}

/// Ingested metrics that nothing uses.
pub fn unused_metrics(ingested: &BTreeSet<String>, in_use: &BTreeSet<String>) -> BTreeSet<String> {
    ingested.difference(in_use).cloned().collect()
}

/// Split names into valid and rejected.
pub fn partition_valid<'a, I>(metrics: I) -> (Vec<&'a str>, Vec<&'a str>)
where
    I: IntoIterator<Item = &'a str>,
{
    metrics.into_iter().partition(|m| is_valid_metric_name(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_metric_name_validation() {
        assert!(is_valid_metric_name("http_requests_total"));
        assert!(is_valid_metric_name("node:cpu_utilisation:avg1m"));
        assert!(!is_valid_metric_name("http-requests"));
        assert!(!is_valid_metric_name("up or 1"));
        assert!(!is_valid_metric_name(""));
        assert!(!is_valid_metric_name("up}[5m]"));
    }

    #[test]
    fn test_histogram_closure() {
        let closure = in_use_closure(["http_requests_bucket"]);
        assert_eq!(
            closure,
            set(&["http_requests_bucket", "http_requests_count", "http_requests_sum"])
        );
    }

    #[test]
    fn test_non_histogram_has_no_companions() {
        assert_eq!(histogram_companions("http_requests_total"), None);
        assert_eq!(histogram_companions("bucket_size"), None);
    }

    #[test]
    fn test_unused_is_exact_difference() {
        let ingested = set(&[
            "apiserver_latency_bucket",
            "apiserver_latency_count",
            "apiserver_latency_sum",
            "go_goroutines",
            "up",
        ]);
        let in_use = in_use_closure(["apiserver_latency_bucket", "up", "up"]);
        assert_eq!(unused_metrics(&ingested, &in_use), set(&["go_goroutines"]));
    }

    #[test]
    fn test_partition_valid() {
        let (valid, rejected) = partition_valid(["up", "bad-name", "node_load1"]);
        assert_eq!(valid, vec!["up", "node_load1"]);
        assert_eq!(rejected, vec!["bad-name"]);
    }
}
