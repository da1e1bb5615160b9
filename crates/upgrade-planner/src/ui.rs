//! Terminal output helpers.
//!
//! Everything here goes to stderr so stdout stays free for the plan or the
//! cluster JSON.

use std::fmt::Write as _;

use colored::Colorize;

use crate::collector::insights_supported;
use crate::entities::{ClusterInfo, HealthIssue};

/// Print a success message.
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message.green());
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

/// Print an info message.
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}

fn describe_health_issue(issue: &HealthIssue) -> String {
    let mut line = format!(
        "{}: {}",
        issue.code.as_deref().unwrap_or("Unknown"),
        issue.message.as_deref().unwrap_or_default()
    );
    if !issue.resource_ids.is_empty() {
        let _ = write!(line, " ({})", issue.resource_ids.join(", "));
    }
    line
}

/// Numbered human-readable summary of collected cluster facts.
///
/// Sections 8 to 11 only appear when facts were collected from inside the
/// cluster.
pub fn cluster_report(info: &ClusterInfo, connect_k8s: bool) -> String {
    let mut out = String::new();
    let unknown = "Unknown";

    let _ = writeln!(out, "1. Cluster Info:");
    let _ = writeln!(out, "   EKS Cluster: {}", info.cluster_name);
    let _ = writeln!(out, "   Region: {}", info.region);
    let _ = writeln!(out, "   Current Version: {}", info.current_version().unwrap_or(unknown));
    let _ = writeln!(out, "   Target Version: {}", info.target_version);

    let _ = writeln!(out, "\n2. Version Skew:");
    if info.kube_proxy_version.is_none() {
        let _ = writeln!(
            out,
            "   WARNING: kube-proxy is not installed as an EKS addon. This may affect cluster upgrades and version compatibility."
        );
    }
    match info.version_skew_recommended {
        Some(true) => {
            let _ = writeln!(out, "   Upgrade recommended:");
            for recommendation in &info.version_skew_recommendations {
                let _ = writeln!(out, "   - {recommendation}");
            }
        }
        Some(false) => {
            let _ = writeln!(out, "   No version skew issues detected.");
        }
        None => {
            let _ = writeln!(
                out,
                "   Unable to check version skew due to missing information."
            );
        }
    }

    let _ = writeln!(out, "\n3. Addon Compatibility Issues:");
    for addon in &info.addon_upgrade_info {
        let _ = writeln!(out, "   - {}:", addon.name);
        let _ = writeln!(out, "     Current Version: {}", addon.current_version);
        let _ = writeln!(out, "     Status: {}", addon.status);
        if let Some(range) = &addon.suggested_version_range {
            let _ = writeln!(out, "     Suggested Version: {range}");
        }
    }

    let _ = writeln!(out, "\n4. Cluster Health Issues:");
    if info.health_issues.is_empty() {
        let _ = writeln!(out, "   No health issues detected.");
    } else {
        for issue in &info.health_issues {
            let _ = writeln!(out, "   - {}", describe_health_issue(issue));
        }
    }

    let _ = writeln!(out, "\n5. Deprecated APIs:");
    if !insights_supported(&info.region) {
        let _ = writeln!(out, "   Not provided");
    } else if info.deprecated_apis.is_empty() {
        let _ = writeln!(out, "   No deprecated APIs detected.");
    } else {
        for api in &info.deprecated_apis {
            let _ = writeln!(out, "   - Current API: {}", api.usage);
            let _ = writeln!(out, "     Replaced With: {}", api.replaced_with);
            let _ = writeln!(out, "     Stop Serving Version: {}", api.stop_serving_version);
            let _ = writeln!(
                out,
                "     Start Serving Replacement Version: {}",
                api.start_serving_replacement_version
            );
            if !api.client_stats.is_empty() {
                let _ = writeln!(out, "     Client Stats:");
                for stat in &api.client_stats {
                    let _ = writeln!(out, "       User Agent: {}", stat.user_agent);
                    let _ = writeln!(
                        out,
                        "       Number of Requests (Last 30 Days): {}",
                        stat.number_of_requests_last30_days
                    );
                    let _ = writeln!(
                        out,
                        "       Last Request Time: {}",
                        stat.last_request_time.as_deref().unwrap_or(unknown)
                    );
                }
            }
            let _ = writeln!(out);
        }
    }

    let _ = writeln!(out, "\n6. Nodegroup List:");
    for nodegroup in &info.nodegroups {
        let _ = writeln!(out, "   - {}: {}", nodegroup.name, nodegroup.version);
    }
    let _ = writeln!(
        out,
        "   Summary: The minimum nodegroup version is: {}",
        info.min_nodegroup_version.as_deref().unwrap_or("None")
    );

    let _ = writeln!(out, "\n7. Fargate Profile List:");
    if info.fargate_profiles.is_empty() {
        let _ = writeln!(out, "   No Fargate profiles found.");
    } else {
        for profile in &info.fargate_profiles {
            let _ = writeln!(out, "   - {profile}");
        }
    }

    if connect_k8s {
        let _ = writeln!(out, "\n8. Self-Managed Nodes:");
        match (&info.min_self_managed_version, info.self_managed_count) {
            (Some(version), count) if count > 0 => {
                let _ = writeln!(out, "   {count} self-managed nodes in this cluster.");
                let _ = writeln!(out, "   Minimum Version: {version}");
            }
            _ => {
                let _ = writeln!(out, "   No self-managed nodes found.");
            }
        }

        let _ = writeln!(out, "\n9. Karpenter Nodes:");
        match (&info.min_karpenter_version, info.karpenter_count) {
            (Some(version), count) if count > 0 => {
                let _ = writeln!(out, "   {count} Karpenter nodes in this cluster.");
                let _ = writeln!(out, "   Minimum Version: {version}");
            }
            _ => {
                let _ = writeln!(out, "   No Karpenter nodes found.");
            }
        }

        let _ = writeln!(out, "\n10. Open Source Addons:");
        if info.opensource_addons.is_empty() {
            let _ = writeln!(out, "   No open source addons found.");
        }
        for addon in &info.opensource_addons {
            if addon.helm_installed {
                let _ = writeln!(
                    out,
                    "   - {}: image version: {} (Helm: chart={}:{}, app={})",
                    addon.name,
                    addon.version,
                    addon.helm_chart_name.as_deref().unwrap_or("unknown"),
                    addon.helm_chart_version.as_deref().unwrap_or("unknown"),
                    addon.helm_app_version.as_deref().unwrap_or("unknown"),
                );
            } else {
                let _ = writeln!(out, "   - {}: image version: {}", addon.name, addon.version);
            }
        }

        let _ = writeln!(out, "\n11. Core Addons (self-managed):");
        if info.core_components.is_empty() {
            let _ = writeln!(out, "   No additional core components found.");
        }
        for component in &info.core_components {
            let _ = writeln!(out, "   - {}: {}", component.name, component.version);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{NodegroupInfo, OpenSourceAddon};

    fn sample() -> ClusterInfo {
        ClusterInfo {
            cluster_name: "prod".to_string(),
            region: "us-west-2".to_string(),
            current_version: Some("1.28".to_string()),
            target_version: "1.29".to_string(),
            nodegroups: vec![NodegroupInfo {
                name: "ng-a".to_string(),
                version: "1.28".to_string(),
            }],
            min_nodegroup_version: Some("1.28".to_string()),
            kube_proxy_version: Some("v1.28.2-eksbuild.2".to_string()),
            version_skew_recommended: Some(false),
            ..ClusterInfo::default()
        }
    }

    #[test]
    fn test_report_sections() {
        let report = cluster_report(&sample(), false);
        assert!(report.starts_with("1. Cluster Info:\n   EKS Cluster: prod\n"));
        assert!(report.contains("No version skew issues detected."));
        assert!(report.contains("   - ng-a: 1.28\n"));
        assert!(report.contains("No deprecated APIs detected."));
        assert!(report.contains("No Fargate profiles found."));
        assert!(!report.contains("8. Self-Managed Nodes"));
    }

    #[test]
    fn test_report_without_kube_proxy_addon() {
        let mut info = sample();
        info.kube_proxy_version = None;
        info.version_skew_recommended = None;
        let report = cluster_report(&info, false);
        assert!(report.contains("kube-proxy is not installed as an EKS addon"));
        assert!(report.contains("Unable to check version skew"));
    }

    #[test]
    fn test_report_in_china_region() {
        let mut info = sample();
        info.region = "cn-north-1".to_string();
        assert!(cluster_report(&info, false).contains("5. Deprecated APIs:\n   Not provided\n"));
    }

    #[test]
    fn test_report_with_in_cluster_facts() {
        let mut info = sample();
        info.min_karpenter_version = Some("v1.28.5-eks-1".to_string());
        info.karpenter_count = 3;
        info.opensource_addons = vec![OpenSourceAddon {
            name: "karpenter".to_string(),
            version: "0.37.0".to_string(),
            helm_installed: true,
            helm_chart_name: Some("karpenter".to_string()),
            helm_chart_version: Some("0.37.0".to_string()),
            helm_app_version: None,
        }];

        let report = cluster_report(&info, true);
        assert!(report.contains("No self-managed nodes found."));
        assert!(report.contains("3 Karpenter nodes in this cluster."));
        assert!(report.contains(
            "   - karpenter: image version: 0.37.0 (Helm: chart=karpenter:0.37.0, app=unknown)"
        ));
        assert!(report.contains("No additional core components found."));
    }
}
