//! Reference document fetching.
//!
//! Documents are embedded verbatim in the topic prompts. A document that
//! cannot be fetched is replaced by a short placeholder so the model knows
//! it is missing; fetching never aborts plan generation.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::errors::{PlannerError, PlannerResult};

/// Per-request timeout for document downloads
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Prefix of the text used in place of a document that failed to download
pub const FETCH_FAILURE_PREFIX: &str = "获取文档失败";

/// Document keys referenced by the topic prompts
pub mod keys {
    pub const TROUBLESHOOTING: &str = "troubleshooting";
    pub const UPDATE_ADDON: &str = "update_addon";
    pub const STANDARD_VERSIONS: &str = "standard_versions";
    pub const EXTENDED_VERSIONS: &str = "extended_versions";
    pub const BEST_PRACTICES: &str = "best_practices";
    pub const API_MIGRATION: &str = "api_migration";
    pub const UPDATE_NODEGROUP: &str = "update_nodegroup";
    pub const UPDATE_KUBERNETES: &str = "update_kubernetes";
}

/// Default document locations
pub const DEFAULT_DOCS: &[(&str, &str)] = &[
    (
        keys::TROUBLESHOOTING,
        "https://docs.aws.amazon.com/eks/latest/userguide/troubleshooting.html",
    ),
    (
        keys::UPDATE_ADDON,
        "https://docs.aws.amazon.com/eks/latest/userguide/updating-an-add-on.html",
    ),
    (
        keys::STANDARD_VERSIONS,
        "https://docs.aws.amazon.com/eks/latest/userguide/kubernetes-versions-standard.html",
    ),
    (
        keys::EXTENDED_VERSIONS,
        "https://docs.aws.amazon.com/eks/latest/userguide/kubernetes-versions-extended.html",
    ),
    (
        keys::BEST_PRACTICES,
        "https://docs.aws.amazon.com/eks/latest/best-practices/cluster-upgrades.html",
    ),
    (
        keys::API_MIGRATION,
        "https://kubernetes.io/docs/reference/using-api/deprecation-guide/",
    ),
    (
        keys::UPDATE_NODEGROUP,
        "https://docs.aws.amazon.com/eks/latest/userguide/update-managed-node-group.html",
    ),
    (
        keys::UPDATE_KUBERNETES,
        "https://docs.aws.amazon.com/eks/latest/userguide/update-cluster.html",
    ),
];

/// Document catalogue: the defaults with any configured overrides applied.
pub fn document_catalog(overrides: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut catalog: BTreeMap<String, String> = DEFAULT_DOCS
        .iter()
        .map(|(key, url)| ((*key).to_string(), (*url).to_string()))
        .collect();
    for (key, url) in overrides {
        catalog.insert(key.clone(), url.clone());
    }
    catalog
}

/// Downloads a document as text.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, String>;
}

/// [`DocumentFetcher`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDocumentFetcher {
    client: reqwest::Client,
}

impl HttpDocumentFetcher {
    pub fn new() -> PlannerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| PlannerError::Http {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(&self, url: &str) -> Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| e.to_string())?;
        response.text().await.map_err(|e| e.to_string())
    }
}

/// Fetched reference documents, keyed by document name.
#[derive(Debug, Clone, Default)]
pub struct ReferenceDocs {
    docs: BTreeMap<String, String>,
}

impl ReferenceDocs {
    /// Document text, or an empty string for an unknown key.
    pub fn get(&self, key: &str) -> String {
        self.docs.get(key).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Fetch every document in the catalogue, one after another.
    pub async fn fetch_all(
        fetcher: &dyn DocumentFetcher,
        catalog: &BTreeMap<String, String>,
    ) -> Self {
        info!(count = catalog.len(), "Fetching reference documents");
        let mut docs = BTreeMap::new();
        for (key, url) in catalog {
            let text = match fetcher.fetch(url).await {
                Ok(text) => text,
                Err(e) => {
                    error!(url = %url, error = %e, "Failed to fetch document");
                    format!("{FETCH_FAILURE_PREFIX}: {e}")
                }
            };
            docs.insert(key.clone(), text);
        }
        Self { docs }
    }
}

impl FromIterator<(String, String)> for ReferenceDocs {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            docs: iter.into_iter().collect(),
        }
    }
}
