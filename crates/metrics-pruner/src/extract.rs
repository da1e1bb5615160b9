//! Unused metric extraction.
//!
//! Finds ingested metrics that no dashboard or rule references and labels
//! each with the scrape jobs that still produce it.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};

use crate::backend::MetricsBackend;
use crate::errors::PrunerResult;
use crate::inventory::Inventory;
use crate::names::{in_use_closure, is_valid_metric_name, unused_metrics};

/// Job label reported for series without one
pub const UNKNOWN_JOB: &str = "Unknown";

/// An unused metric and one job producing it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct JobMetric {
    pub job: String,
    pub metric: String,
}

/// Outcome of labelling candidates by job.
#[derive(Debug, Clone, Default)]
pub struct JobLabels {
    pub labeled: Vec<JobMetric>,
    /// Names skipped because they are unsafe to query
    pub rejected: Vec<String>,
    /// Metrics the workspace returned no series for
    pub not_found: Vec<String>,
    /// Metrics whose query failed; they are left out of the report
    pub failed: Vec<String>,
}

/// Counts and labels from one extraction run.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub in_use: usize,
    pub ingested: usize,
    pub unused: usize,
    pub labels: JobLabels,
}

impl Extraction {
    /// Drop candidates grouped per job.
    pub fn report(&self) -> String {
        format_job_report(&self.labels.labeled)
    }
}

fn job_query(metric: &str) -> String {
    format!("sum({metric}) by (job)")
}

/// Query the job labels of every unused metric, one metric at a time.
///
/// Rejected, not-found and failed metrics are returned for the caller to
/// report; only query errors are logged here.
pub async fn label_by_job(
    backend: &dyn MetricsBackend,
    unused: &BTreeSet<String>,
) -> JobLabels {
    let mut labels = JobLabels::default();

    for metric in unused {
        if !is_valid_metric_name(metric) {
            labels.rejected.push(metric.clone());
            continue;
        }

        let response = match backend.query(&job_query(metric)).await {
            Ok(response) => response,
            Err(e) => {
                warn!(metric = %metric, error = %e, "Error querying workspace");
                labels.failed.push(metric.clone());
                continue;
            }
        };

        if response.data.result.is_empty() {
            labels.not_found.push(metric.clone());
        }

        for sample in response.data.result {
            let Some(series) = sample.metric else {
                warn!(metric = %metric, "Series without labels, skipping");
                continue;
            };
            let job = series
                .get("job")
                .cloned()
                .unwrap_or_else(|| UNKNOWN_JOB.to_string());
            labels.labeled.push(JobMetric {
                job,
                metric: metric.clone(),
            });
        }
    }

    labels
}

/// `Job: <job>` lines, each followed by that job's metrics joined with `|`.
///
/// Jobs are sorted by name and so are the metrics of each job.
pub fn format_job_report(labeled: &[JobMetric]) -> String {
    let mut by_job: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for entry in labeled {
        by_job
            .entry(entry.job.as_str())
            .or_default()
            .insert(entry.metric.as_str());
    }

    by_job
        .into_iter()
        .map(|(job, metrics)| {
            let metrics: Vec<&str> = metrics.into_iter().collect();
            format!("Job: {job}\n{}\n", metrics.join("|"))
        })
        .collect()
}

/// Run the whole extraction against the files in `inventory`.
pub async fn extract_unused(
    inventory: &Inventory,
    backend: &dyn MetricsBackend,
) -> PrunerResult<Extraction> {
    let in_use = in_use_closure(inventory.used_metrics()?);
    info!(count = in_use.len(), "Number of in-use metrics");

    let ingested = inventory.ingested_metrics()?;
    info!(count = ingested.len(), "Number of ingested metrics");

    let unused = unused_metrics(&ingested, &in_use);
    info!(count = unused.len(), "Number of unused metrics");

    let labels = label_by_job(backend, &unused).await;

    Ok(Extraction {
        in_use: in_use.len(),
        ingested: ingested.len(),
        unused: unused.len(),
        labels,
    })
}
