//! Pure checks over collected facts.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::MinorVersion;
use crate::entities::AddonUpgradeInfo;

/// Highest minor version assumed to exist when an upgrade path crosses a major
const MAJOR_CROSSING_MINOR_CAP: u32 = 13;

/// Placeholder range for add-ons without a usable version
pub const NO_SUPPORTED_VERSION: &str = "No supported version";

pub const STATUS_COMPATIBLE: &str = "Compatible";
pub const STATUS_UPGRADE_RECOMMENDED: &str = "Upgrade recommended";

/// Numeric sort key of a version string: leading `v` and any `-suffix` are
/// dropped, non-numeric components count as zero.
pub fn version_key(version: &str) -> Vec<u64> {
    let core = version.trim().trim_start_matches('v');
    let core = core.split('-').next().unwrap_or(core);
    core.split('.').map(|part| part.parse().unwrap_or(0)).collect()
}

/// Compare two version strings by [`version_key`].
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    version_key(a).cmp(&version_key(b))
}

/// The lowest version in `versions`, if any.
pub fn min_version<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions.into_iter().min_by(|a, b| compare_versions(a, b))
}

/// Parse a `major.minor` prefix, accepting a leading `v` (e.g. `v1.29.0-eksbuild.1`).
pub fn parse_loose(version: &str) -> Option<MinorVersion> {
    MinorVersion::parse(version.trim().trim_start_matches('v')).ok()
}

/// Every Kubernetes version from `current` through `target`, inclusive.
///
/// When the path crosses a major version, minors of the older major are
/// assumed to stop at `.13`.
pub fn kubernetes_versions_between(current: MinorVersion, target: MinorVersion) -> Vec<String> {
    let mut versions = Vec::new();
    for major in current.major..=target.major {
        let first = if major == current.major { current.minor } else { 0 };
        let last = if major == target.major {
            target.minor
        } else {
            MAJOR_CROSSING_MINOR_CAP
        };
        for minor in first..=last {
            versions.push(format!("{major}.{minor}"));
        }
    }
    versions
}

/// Work out the upgrade status of one add-on from its compatible versions
/// per Kubernetes version.
///
/// Returns the add-on summary and whether the cluster upgrade can go ahead
/// as far as this add-on is concerned.
pub fn assess_addon(
    name: &str,
    current_version: &str,
    target_version: &str,
    compatible_versions: BTreeMap<String, Vec<String>>,
) -> (AddonUpgradeInfo, bool) {
    let mut info = AddonUpgradeInfo {
        name: name.to_string(),
        current_version: current_version.to_string(),
        ..AddonUpgradeInfo::default()
    };

    let has_versions = compatible_versions.values().any(|v| !v.is_empty());
    let target_compatible = compatible_versions
        .get(target_version)
        .is_some_and(|v| !v.is_empty());

    let ok = if !has_versions {
        info.status = "No compatible versions found for any Kubernetes version".to_string();
        info.suggested_version_range = Some(NO_SUPPORTED_VERSION.to_string());
        false
    } else if !target_compatible {
        info.status = format!("Not compatible with target version {target_version}");
        info.suggested_version_range = Some(NO_SUPPORTED_VERSION.to_string());
        false
    } else {
        let mut lists = compatible_versions.values().filter(|v| !v.is_empty());
        let mut common: BTreeSet<&str> = lists
            .next()
            .map(|first| first.iter().map(String::as_str).collect())
            .unwrap_or_default();
        for list in lists {
            common.retain(|v| list.iter().any(|candidate| candidate == v));
        }

        let lowest = min_version(common.iter().copied());
        let highest = common.iter().copied().max_by(|a, b| compare_versions(a, b));
        match (lowest, highest) {
            (Some(lowest), Some(highest)) => {
                info.suggested_version_range = Some(format!("{lowest} to {highest}"));
                let below = compare_versions(current_version, lowest) == Ordering::Less;
                let above = compare_versions(current_version, highest) == Ordering::Greater;
                info.status = if below || above {
                    STATUS_UPGRADE_RECOMMENDED
                } else {
                    STATUS_COMPATIBLE
                }
                .to_string();
                true
            }
            _ => {
                info.status =
                    "No common compatible version found across all Kubernetes versions".to_string();
                info.suggested_version_range = Some(NO_SUPPORTED_VERSION.to_string());
                false
            }
        }
    };

    info.compatible_versions = compatible_versions;
    (info, ok)
}

/// Result of the node/kube-proxy skew check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SkewCheck {
    pub upgrade_recommended: bool,
    pub recommendations: Vec<String>,
}

/// Check node group and kube-proxy versions against the skew the target
/// control plane allows (three minors from 1.28, two before).
pub fn check_version_skew(
    current_version: &str,
    min_nodegroup_version: Option<&str>,
    kube_proxy_version: Option<&str>,
    target_version: &str,
) -> Option<SkewCheck> {
    let current = parse_loose(current_version)?;
    let target = parse_loose(target_version)?;
    let allowed = if current >= MinorVersion::new(1, 28) { 3 } else { 2 };

    let mut check = SkewCheck::default();

    if let Some(nodegroup) = min_nodegroup_version.and_then(parse_loose) {
        if nodegroup.minors_until(target) > allowed {
            check.upgrade_recommended = true;
            check.recommendations.push(format!(
                "Nodegroup incompatible with target version. Upgrade nodegroup to at least {current_version}"
            ));
        }
    }

    if let Some(raw) = kube_proxy_version {
        if let Some(kube_proxy) = parse_loose(raw) {
            if kube_proxy.minors_until(target) > allowed {
                check.upgrade_recommended = true;
                check.recommendations.push(format!(
                    "Kube-proxy incompatible with target version. Upgrade kube-proxy addon from {raw} to at least {current_version}"
                ));
            }
        }
    }

    Some(check)
}

/// Check a collection target: newer than current and at most three minors ahead.
pub fn validate_target_version(current_version: &str, target_version: &str) -> Result<(), String> {
    let (Some(current), Some(target)) = (parse_loose(current_version), parse_loose(target_version))
    else {
        return Err(format!(
            "Error validating versions: expected 'x.y', got '{current_version}' and '{target_version}'"
        ));
    };

    if target <= current {
        return Err(format!(
            "Target version {target_version} must be greater than current version {current_version}"
        ));
    }

    if current.minors_until(target) > 3 {
        return Err(format!(
            "Target version {target_version} must be less than or equal to 3 minor versions higher than current version {current_version}"
        ));
    }

    Ok(())
}
