//! Before/after validation of metric drop rules.
//!
//! `before` records which in-use metrics are already absent. `after` reports
//! in-use metrics that went missing since, i.e. metrics dropped by mistake.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::backend::MetricsBackend;
use crate::errors::{PrunerError, PrunerResult};
use crate::inventory::Inventory;
use crate::names::{in_use_closure, partition_valid};

static REGION_REGEX: OnceLock<Regex> = OnceLock::new();
static WORKSPACE_ID_REGEX: OnceLock<Regex> = OnceLock::new();

/// Sample value meaning "absent" for `absent_over_time`
const ABSENT: &str = "1";

/// Which side of a drop-rule change a run is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    Before,
    After,
}

/// Check region and workspace id before they are put in a URL.
pub fn validate_target(region: &str, workspace_id: &str) -> PrunerResult<()> {
    let region_ok = REGION_REGEX
        .get_or_init(|| Regex::new(r"^[a-z0-9-]+$").expect("Invalid regex pattern"))
        .is_match(region);
    let workspace_ok = WORKSPACE_ID_REGEX
        .get_or_init(|| Regex::new(r"^ws-[a-f0-9-]+$").expect("Invalid regex pattern"))
        .is_match(workspace_id);

    if region_ok && workspace_ok {
        Ok(())
    } else {
        Err(PrunerError::InvalidTarget {
            region: region.to_string(),
            workspace_id: workspace_id.to_string(),
        })
    }
}

fn absence_query(metric: &str) -> String {
    format!("absent_over_time({metric}[5m])")
}

/// In-use metrics (with histogram companions) that are safe to query.
///
/// Invalid names are warned about and left out.
pub fn checked_metrics(used: &[String]) -> BTreeSet<String> {
    let (valid, rejected) = partition_valid(used.iter().map(String::as_str));
    for metric in rejected {
        warn!(metric, "Invalid metric name, skipping");
    }
    in_use_closure(valid)
}

/// Result of checking every in-use metric for absence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbsenceCheck {
    /// Metrics the workspace reports as absent
    pub missing: Vec<String>,
    /// Metrics whose query failed; their presence is unknown
    pub failed: Vec<String>,
}

/// Query the workspace for metrics absent over the last five minutes.
pub async fn find_missing(backend: &dyn MetricsBackend, metrics: &BTreeSet<String>) -> AbsenceCheck {
    let mut check = AbsenceCheck::default();
    for metric in metrics {
        match backend.query(&absence_query(metric)).await {
            Ok(response) => {
                let absent = response
                    .data
                    .result
                    .first()
                    .and_then(|s| s.value_text())
                    .is_some_and(|v| v == ABSENT);
                if absent {
                    check.missing.push(metric.clone());
                }
            }
            Err(e) => {
                warn!(metric = %metric, error = %e, "Error querying metric");
                check.failed.push(metric.clone());
            }
        }
    }
    check
}

/// Metrics missing now that were not missing in the snapshot, sorted.
pub fn newly_missing(missing_now: &[String], missing_before: &BTreeSet<String>) -> Vec<String> {
    missing_now
        .iter()
        .filter(|m| !missing_before.contains(*m))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Result of a validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Metrics already missing; the snapshot is written only when no query failed
    Recorded {
        checked: usize,
        missing: Vec<String>,
        failed: Vec<String>,
    },
    /// Metrics missing now but not before
    Compared {
        checked: usize,
        newly_missing: Vec<String>,
        failed: Vec<String>,
    },
}

impl Outcome {
    /// Metrics whose query failed.
    pub fn failed(&self) -> &[String] {
        match self {
            Self::Recorded { failed, .. } | Self::Compared { failed, .. } => failed,
        }
    }

    /// Human-readable summary lines.
    pub fn summary(&self) -> String {
        let mut out = match self {
            Self::Recorded { missing, failed, .. } if missing.is_empty() && failed.is_empty() => {
                "Congratulations! All metrics in use are present in Prometheus!".to_string()
            }
            Self::Recorded { missing, .. } if missing.is_empty() => String::new(),
            Self::Recorded { missing, .. } => {
                format!("There are total {} metrics missing!", missing.len())
            }
            Self::Compared { newly_missing, failed, .. }
                if newly_missing.is_empty() && failed.is_empty() =>
            {
                "Congratulations! No metrics missing due to false dropping!".to_string()
            }
            Self::Compared { newly_missing, .. } if newly_missing.is_empty() => String::new(),
            Self::Compared { newly_missing, .. } => format!(
                "There are total {} metrics missing after metrics filtering!\nMissing metrics:\n{}",
                newly_missing.len(),
                newly_missing.join("\n")
            ),
        };

        let failed = self.failed();
        if !failed.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!(
                "Queries failed for {} metrics, results are incomplete:\n{}",
                failed.len(),
                failed.join("\n")
            ));
            if matches!(self, Self::Recorded { .. }) {
                out.push_str("\nSnapshot not written.");
            }
        }
        out
    }

    /// Whether every query succeeded and nothing is missing (`before`) or
    /// went missing (`after`).
    pub fn is_clean(&self) -> bool {
        let nothing_missing = match self {
            Self::Recorded { missing, .. } => missing.is_empty(),
            Self::Compared { newly_missing, .. } => newly_missing.is_empty(),
        };
        nothing_missing && self.failed().is_empty()
    }
}

/// Run one validation pass.
///
/// In `after` mode the snapshot is read before any query is sent, so a
/// missing snapshot fails fast. In `before` mode a run with failed queries
/// leaves the existing snapshot untouched.
pub async fn validate(
    inventory: &Inventory,
    backend: &dyn MetricsBackend,
    mode: Mode,
) -> PrunerResult<Outcome> {
    let metrics = checked_metrics(&inventory.used_metrics()?);
    info!(count = metrics.len(), "Number of in-use metrics");

    let before = match mode {
        Mode::After => Some(inventory.read_snapshot()?),
        Mode::Before => None,
    };

    let AbsenceCheck { missing, failed } = find_missing(backend, &metrics).await;

    match before {
        None => {
            if failed.is_empty() {
                let path = inventory.write_snapshot(&missing)?;
                info!(path = %path.display(), count = missing.len(), "Wrote missing metrics snapshot");
            } else {
                warn!(failed = failed.len(), "Queries failed, keeping the previous snapshot");
            }
            Ok(Outcome::Recorded {
                checked: metrics.len(),
                missing,
                failed,
            })
        }
        Some(before) => Ok(Outcome::Compared {
            checked: metrics.len(),
            newly_missing: newly_missing(&missing, &before),
            failed,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_validation() {
        assert!(validate_target("us-east-1", "ws-0a1b2c3d-4e5f-6789-abcd-ef0123456789").is_ok());
        assert!(validate_target("US-EAST-1", "ws-abc").is_err());
        assert!(validate_target("us-east-1", "workspace-1").is_err());
        assert!(validate_target("us-east-1", "ws-XYZ").is_err());
        assert!(validate_target("us-east-1/../x", "ws-abc").is_err());
    }

    #[test]
    fn test_checked_metrics_skip_invalid_names() {
        let used = vec![
            "up".to_string(),
            "bad metric".to_string(),
            "http_duration_seconds_bucket".to_string(),
        ];
        let checked = checked_metrics(&used);
        assert_eq!(checked.len(), 4);
        assert!(checked.contains("http_duration_seconds_count"));
        assert!(!checked.contains("bad metric"));
    }

    #[test]
    fn test_newly_missing() {
        let before: BTreeSet<String> = ["legacy_metric".to_string()].into();
        let now = vec!["up".to_string(), "legacy_metric".to_string()];
        assert_eq!(newly_missing(&now, &before), vec!["up"]);
        assert!(newly_missing(&["legacy_metric".to_string()], &before).is_empty());
    }

    #[test]
    fn test_summaries() {
        let ok = Outcome::Recorded {
            checked: 3,
            missing: vec![],
            failed: vec![],
        };
        assert!(ok.summary().starts_with("Congratulations! All metrics"));

        let regressed = Outcome::Compared {
            checked: 3,
            newly_missing: vec!["up".to_string(), "node_load1".to_string()],
            failed: vec![],
        };
        assert_eq!(
            regressed.summary(),
            "There are total 2 metrics missing after metrics filtering!\nMissing metrics:\nup\nnode_load1"
        );
        assert!(!regressed.is_clean());
        assert!(ok.is_clean());
    }

    #[test]
    fn test_failures_are_never_congratulated() {
        let unknown = Outcome::Recorded {
            checked: 2,
            missing: vec![],
            failed: vec!["up".to_string(), "node_load1".to_string()],
        };
        assert!(!unknown.is_clean());
        assert_eq!(
            unknown.summary(),
            "Queries failed for 2 metrics, results are incomplete:\nup\nnode_load1\nSnapshot not written."
        );

        let partial = Outcome::Compared {
            checked: 2,
            newly_missing: vec!["up".to_string()],
            failed: vec!["node_load1".to_string()],
        };
        assert!(!partial.is_clean());
        assert_eq!(
            partial.summary(),
            "There are total 1 metrics missing after metrics filtering!\nMissing metrics:\nup\n\
             Queries failed for 1 metrics, results are incomplete:\nnode_load1"
        );
    }

    #[test]
    fn test_absence_query() {
        assert_eq!(absence_query("up"), "absent_over_time(up[5m])");
    }
}
