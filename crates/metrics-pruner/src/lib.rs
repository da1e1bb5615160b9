//! # Metrics Pruner
//!
//! Finds metrics an Amazon Managed Service for Prometheus workspace ingests
//! but no dashboard or rule uses, and checks that drop rules did not remove
//! anything still in use.
//!
//! Inputs are JSON exports in one directory:
//! - `metrics-in-grafana.json` and `metrics-in-ruler.json` (`metricsUsed`)
//! - `metrics-prometheus-all.json` (`data`, the `__name__` label values)

// Error types
pub mod errors;

// Metric name rules
pub mod names;

// Input files and the missing-metrics snapshot
pub mod inventory;

// Workspace queries
pub mod backend;

// Pipelines
pub mod extract;
pub mod validate;

// Terminal UI helpers
pub mod ui;

pub use backend::{HttpMetricsBackend, MetricsBackend, QueryResponse};
pub use errors::{PrunerError, PrunerResult};
pub use extract::{extract_unused, Extraction, JobMetric};
pub use inventory::Inventory;
pub use validate::{validate, validate_target, Mode, Outcome};
