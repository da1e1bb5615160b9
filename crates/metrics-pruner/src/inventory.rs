//! Metric inventories exported from Grafana, the ruler and the workspace.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::errors::{PrunerError, PrunerResult};

/// Metrics referenced by dashboards
pub const GRAFANA_METRICS_FILE: &str = "metrics-in-grafana.json";
/// Metrics referenced by recording and alerting rules
pub const RULER_METRICS_FILE: &str = "metrics-in-ruler.json";
/// Every metric name the workspace has ingested
pub const ALL_METRICS_FILE: &str = "metrics-prometheus-all.json";
/// Metrics already missing before a drop rule was applied
pub const SNAPSHOT_FILE: &str = "missing_metrics_before.json";

#[derive(Debug, Deserialize)]
struct UsedMetrics {
    #[serde(rename = "metricsUsed", default)]
    metrics_used: Vec<String>,
}

/// Label values response of the workspace (`/api/v1/label/__name__/values`).
#[derive(Debug, Deserialize)]
struct IngestedMetrics {
    data: Vec<String>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> PrunerResult<T> {
    let error = |reason: String| PrunerError::InventoryRead {
        path: path.display().to_string(),
        reason,
    };
    let content = std::fs::read_to_string(path).map_err(|e| error(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| error(e.to_string()))
}

/// Input files, resolved against one directory.
#[derive(Debug, Clone)]
pub struct Inventory {
    dir: PathBuf,
}

impl Inventory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Metric names listed by the Grafana and ruler exports, in file order.
    pub fn used_metrics(&self) -> PrunerResult<Vec<String>> {
        let mut metrics = Vec::new();
        for file in [GRAFANA_METRICS_FILE, RULER_METRICS_FILE] {
            let used: UsedMetrics = read_json(&self.path(file))?;
            debug!(file, count = used.metrics_used.len(), "Loaded used metrics");
            metrics.extend(used.metrics_used);
        }
        Ok(metrics)
    }

    /// Every ingested metric name.
    pub fn ingested_metrics(&self) -> PrunerResult<BTreeSet<String>> {
        let ingested: IngestedMetrics = read_json(&self.path(ALL_METRICS_FILE))?;
        Ok(ingested.data.into_iter().collect())
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.path(SNAPSHOT_FILE)
    }

    /// Metrics recorded as missing by an earlier `before` run.
    pub fn read_snapshot(&self) -> PrunerResult<BTreeSet<String>> {
        let path = self.snapshot_path();
        let error = |reason: String| PrunerError::SnapshotRead {
            path: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(&path).map_err(|e| error(e.to_string()))?;
        let missing: Vec<String> = serde_json::from_str(&content).map_err(|e| error(e.to_string()))?;
        Ok(missing.into_iter().collect())
    }

    /// Persist the metrics missing now, as a pretty JSON array.
    pub fn write_snapshot(&self, missing: &[String]) -> PrunerResult<PathBuf> {
        let path = self.snapshot_path();
        let error = |reason: String| PrunerError::SnapshotWrite {
            path: path.display().to_string(),
            reason,
        };
        let json = serde_json::to_string_pretty(missing).map_err(|e| error(e.to_string()))?;
        std::fs::write(&path, json).map_err(|e| error(e.to_string()))?;
        Ok(path)
    }
}
