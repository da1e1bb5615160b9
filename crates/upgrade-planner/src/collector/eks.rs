//! EKS control plane facts via `aws-sdk-eks`.

use std::collections::BTreeSet;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_eks::{
    config::{self, retry::RetryConfig},
    error::DisplayErrorContext,
    primitives::DateTimeFormat,
    types::{self, Category},
    Client,
};
use tracing::{debug, warn};

use super::{ClusterDescription, ClusterFactCollector};
use crate::entities::{
    AddonCompatibilityDetail, CategorySummary, ClientStat, CompatibilityIssue, DeprecatedApi,
    HealthIssue, InsightResource, InsightStatus, InstalledAddon, NodegroupInfo,
};
use crate::errors::{PlannerError, PlannerResult};

/// Attempts per EKS API call, including the first
const EKS_MAX_ATTEMPTS: u32 = 3;

fn eks_error(operation: &str, err: &impl std::error::Error) -> PlannerError {
    PlannerError::Eks {
        operation: operation.to_string(),
        reason: DisplayErrorContext(err).to_string(),
    }
}

/// Region from the shared AWS configuration (environment, profile).
pub async fn resolve_region(profile: Option<&str>) -> Option<String> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    loader.load().await.region().map(ToString::to_string)
}

/// `explicit` when given, else the region of the shared AWS configuration.
pub async fn require_region(explicit: Option<&str>, profile: Option<&str>) -> PlannerResult<String> {
    match explicit {
        Some(region) => Ok(region.to_string()),
        None => resolve_region(profile).await.ok_or(PlannerError::MissingRegion),
    }
}

/// [`ClusterFactCollector`] backed by the EKS API.
#[derive(Clone, Debug)]
pub struct EksCollector {
    client: Client,
}

impl EksCollector {
    /// Build a client for `region` using the default credential chain.
    pub async fn connect(region: &str, profile: Option<&str>) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let sdk = loader.load().await;

        let client = Client::from_conf(
            config::Builder::from(&sdk)
                .retry_config(RetryConfig::standard().with_max_attempts(EKS_MAX_ATTEMPTS))
                .build(),
        );
        Self { client }
    }

    async fn describe_insight(&self, cluster: &str, id: &str) -> PlannerResult<CompatibilityIssue> {
        let output = self
            .client
            .describe_insight()
            .cluster_name(cluster)
            .id(id)
            .send()
            .await
            .map_err(|e| eks_error("DescribeInsight", &e))?;

        Ok(output.insight().map(convert_insight).unwrap_or_default())
    }
}

fn convert_status(status: Option<&types::InsightStatus>) -> InsightStatus {
    status
        .map(|s| InsightStatus {
            status: s.status().map(|v| v.as_str().to_string()).unwrap_or_default(),
            reason: s.reason().unwrap_or_default().to_string(),
        })
        .unwrap_or_default()
}

fn convert_client_stat(stat: &types::ClientStat) -> ClientStat {
    ClientStat {
        user_agent: stat.user_agent().unwrap_or_default().to_string(),
        number_of_requests_last30_days: i64::from(stat.number_of_requests_last30_days()),
        last_request_time: stat
            .last_request_time()
            .and_then(|t| t.fmt(DateTimeFormat::DateTime).ok()),
    }
}

fn convert_deprecation(detail: &types::DeprecationDetail) -> DeprecatedApi {
    DeprecatedApi {
        usage: detail.usage().unwrap_or_default().to_string(),
        replaced_with: detail.replaced_with().unwrap_or_default().to_string(),
        stop_serving_version: detail.stop_serving_version().unwrap_or_default().to_string(),
        start_serving_replacement_version: detail
            .start_serving_replacement_version()
            .unwrap_or_default()
            .to_string(),
        client_stats: detail.client_stats().iter().map(convert_client_stat).collect(),
    }
}

fn convert_insight(insight: &types::Insight) -> CompatibilityIssue {
    let status = convert_status(insight.insight_status());
    let summary = insight
        .category_specific_summary()
        .map(|summary| CategorySummary {
            deprecation_details: summary
                .deprecation_details()
                .iter()
                .map(convert_deprecation)
                .collect(),
            addon_compatibility_details: summary
                .addon_compatibility_details()
                .iter()
                .map(|d| AddonCompatibilityDetail {
                    name: d.name().unwrap_or_default().to_string(),
                    compatible_versions: d.compatible_versions().to_vec(),
                })
                .collect(),
        })
        .unwrap_or_default();

    CompatibilityIssue {
        name: insight.name().unwrap_or_default().to_string(),
        status: status.status,
        reason: status.reason,
        recommendation: insight.recommendation().unwrap_or_default().to_string(),
        additional_info: insight
            .additional_info()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default(),
        resources: insight
            .resources()
            .iter()
            .map(|r| InsightResource {
                arn: r.arn().map(str::to_string),
                kubernetes_resource_uri: r.kubernetes_resource_uri().map(str::to_string),
                insight_status: convert_status(r.insight_status()),
            })
            .collect(),
        category_specific_summary: summary,
    }
}

#[async_trait]
impl ClusterFactCollector for EksCollector {
    async fn describe_cluster(&self, cluster: &str) -> PlannerResult<ClusterDescription> {
        let output = match self.client.describe_cluster().name(cluster).send().await {
            Ok(output) => output,
            Err(e) => {
                let not_found = e
                    .as_service_error()
                    .is_some_and(|se| se.is_resource_not_found_exception());
                if not_found {
                    return Err(PlannerError::ClusterNotFound {
                        name: cluster.to_string(),
                    });
                }
                return Err(eks_error("DescribeCluster", &e));
            }
        };

        let Some(details) = output.cluster() else {
            return Err(PlannerError::ClusterNotFound {
                name: cluster.to_string(),
            });
        };

        let health_issues = details
            .health()
            .map(|health| {
                health
                    .issues()
                    .iter()
                    .map(|issue| HealthIssue {
                        code: issue.code().map(|c| c.as_str().to_string()),
                        message: issue.message().map(str::to_string),
                        resource_ids: issue.resource_ids().to_vec(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(ClusterDescription {
            version: details.version().unwrap_or_default().to_string(),
            health_issues,
        })
    }

    async fn upgrade_insights(&self, cluster: &str) -> PlannerResult<Vec<CompatibilityIssue>> {
        let mut ids = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .client
                .list_insights()
                .cluster_name(cluster)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| eks_error("ListInsights", &e))?;

            ids.extend(
                output
                    .insights()
                    .iter()
                    .filter(|i| i.category() == Some(&Category::UpgradeReadiness))
                    .filter_map(|i| i.id().map(str::to_string)),
            );

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }
        debug!(cluster, count = ids.len(), "Found upgrade readiness insights");

        let mut issues = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.describe_insight(cluster, id).await {
                Ok(issue) => issues.push(issue),
                Err(e) => warn!(insight = %id, error = %e, "Failed to describe insight"),
            }
        }
        Ok(issues)
    }

    async fn nodegroups(&self, cluster: &str) -> PlannerResult<Vec<NodegroupInfo>> {
        let mut names = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .client
                .list_nodegroups()
                .cluster_name(cluster)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| eks_error("ListNodegroups", &e))?;
            names.extend(output.nodegroups().iter().cloned());
            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        let mut nodegroups = Vec::with_capacity(names.len());
        for name in names {
            let output = self
                .client
                .describe_nodegroup()
                .cluster_name(cluster)
                .nodegroup_name(&name)
                .send()
                .await
                .map_err(|e| eks_error("DescribeNodegroup", &e))?;
            let version = output
                .nodegroup()
                .and_then(|ng| ng.version())
                .unwrap_or_default()
                .to_string();
            nodegroups.push(NodegroupInfo { name, version });
        }
        Ok(nodegroups)
    }

    async fn fargate_profiles(&self, cluster: &str) -> PlannerResult<Vec<String>> {
        let mut profiles = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .client
                .list_fargate_profiles()
                .cluster_name(cluster)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| eks_error("ListFargateProfiles", &e))?;
            profiles.extend(output.fargate_profile_names().iter().cloned());
            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }
        Ok(profiles)
    }

    async fn installed_addons(&self, cluster: &str) -> PlannerResult<Vec<InstalledAddon>> {
        let output = self
            .client
            .list_addons()
            .cluster_name(cluster)
            .send()
            .await
            .map_err(|e| eks_error("ListAddons", &e))?;

        let mut addons = Vec::with_capacity(output.addons().len());
        for name in output.addons() {
            let described = self
                .client
                .describe_addon()
                .cluster_name(cluster)
                .addon_name(name)
                .send()
                .await
                .map_err(|e| eks_error("DescribeAddon", &e))?;
            let version = described
                .addon()
                .and_then(|a| a.addon_version())
                .unwrap_or_default()
                .to_string();
            addons.push(InstalledAddon {
                name: name.clone(),
                version,
            });
        }
        Ok(addons)
    }

    async fn addon_versions(
        &self,
        addon: &str,
        kubernetes_version: &str,
    ) -> PlannerResult<Vec<String>> {
        let output = self
            .client
            .describe_addon_versions()
            .kubernetes_version(kubernetes_version)
            .addon_name(addon)
            .send()
            .await
            .map_err(|e| eks_error("DescribeAddonVersions", &e))?;

        let Some(info) = output.addons().first() else {
            return Ok(Vec::new());
        };

        let versions: BTreeSet<String> = info
            .addon_versions()
            .iter()
            .filter(|v| !v.compatibilities().is_empty())
            .filter_map(|v| v.addon_version().map(str::to_string))
            .collect();
        Ok(versions.into_iter().collect())
    }
}
