//! In-cluster facts via the Kubernetes API server.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use k8s_openapi::api::core::v1::{Node, PodTemplateSpec};
use kube::api::{Api, ListParams};
use kube::Client;
use tracing::{debug, info, warn};

use super::analysis::min_version;
use super::{ClusterInspector, NodeVersions};
use crate::entities::{ComponentVersion, InstalledAddon, OpenSourceAddon};
use crate::errors::PlannerResult;

/// Nodes fetched per list request
const NODE_PAGE_SIZE: u32 = 100;

const KARPENTER_LABELS: &[&str] = &["karpenter.sh/nodepool", "karpenter.sh/provisioner-name"];
const MANAGED_NODEGROUP_LABEL_PREFIX: &str = "eks.amazonaws.com/nodegroup";

const HELM_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
const HELM_CHART: &str = "helm.sh/chart";
const APP_VERSION: &str = "app.kubernetes.io/version";
const APP_INSTANCE: &str = "app.kubernetes.io/instance";

/// Version reported when an image has no tag
pub const UNKNOWN_VERSION: &str = "unknown";

/// How a node was provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Karpenter,
    ManagedNodegroup,
    SelfManaged,
}

/// Classify a node by its labels.
pub fn classify_node(labels: &BTreeMap<String, String>) -> NodeKind {
    if KARPENTER_LABELS.iter().any(|l| labels.contains_key(*l)) {
        NodeKind::Karpenter
    } else if labels
        .keys()
        .any(|l| l.starts_with(MANAGED_NODEGROUP_LABEL_PREFIX))
    {
        NodeKind::ManagedNodegroup
    } else {
        NodeKind::SelfManaged
    }
}

/// Version from an image reference's tag, without a leading `v`.
pub fn image_version(image: &str) -> String {
    match image.rsplit_once(':') {
        Some((_, tag)) => tag.strip_prefix('v').unwrap_or(tag).to_string(),
        None => UNKNOWN_VERSION.to_string(),
    }
}

/// Record Helm release details carried by a workload's labels.
pub fn apply_helm_labels(labels: &BTreeMap<String, String>, addon: &mut OpenSourceAddon) {
    let managed_by_helm = labels.get(HELM_MANAGED_BY).is_some_and(|v| v == "Helm");
    if !managed_by_helm && !labels.contains_key(HELM_CHART) {
        return;
    }
    addon.helm_installed = true;

    // Chart label is `<name>-<version>`; the name may contain dashes
    if let Some((name, version)) = labels.get(HELM_CHART).and_then(|c| c.rsplit_once('-')) {
        addon.helm_chart_name = Some(name.to_string());
        addon.helm_chart_version = Some(version.to_string());
    }

    addon.helm_app_version = labels
        .get(APP_VERSION)
        .or_else(|| labels.get(APP_INSTANCE))
        .cloned();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkloadKind {
    Deployment,
    DaemonSet,
}

/// A well-known workload to look for.
struct KnownWorkload {
    name: &'static str,
    namespace: &'static str,
    kind: WorkloadKind,
    /// Reported name, when it differs from the workload name
    display_name: Option<&'static str>,
    /// Skip when installed as this EKS add-on
    eks_addon: Option<&'static str>,
}

impl KnownWorkload {
    const fn deployment(name: &'static str, namespace: &'static str) -> Self {
        Self {
            name,
            namespace,
            kind: WorkloadKind::Deployment,
            display_name: None,
            eks_addon: None,
        }
    }

    const fn daemonset(name: &'static str, namespace: &'static str) -> Self {
        Self {
            name,
            namespace,
            kind: WorkloadKind::DaemonSet,
            display_name: None,
            eks_addon: None,
        }
    }

    const fn shown_as(mut self, display_name: &'static str) -> Self {
        self.display_name = Some(display_name);
        self
    }

    const fn eks_addon(mut self, addon: &'static str) -> Self {
        self.eks_addon = Some(addon);
        self
    }

    fn reported_name(&self) -> &'static str {
        self.display_name.unwrap_or(self.name)
    }
}

const OPENSOURCE_ADDONS: &[KnownWorkload] = &[
    KnownWorkload::deployment("metrics-server", "kube-system").eks_addon("metrics-server"),
    KnownWorkload::deployment("cluster-autoscaler", "kube-system"),
    KnownWorkload::deployment("karpenter", "karpenter"),
    KnownWorkload::deployment("karpenter", "kube-system"),
    KnownWorkload::deployment("aws-load-balancer-controller", "kube-system"),
    KnownWorkload::deployment("external-dns", "kube-system"),
    KnownWorkload::deployment("cert-manager", "cert-manager"),
    KnownWorkload::deployment("ingress-nginx-controller", "ingress-nginx").shown_as("ingress-nginx"),
    KnownWorkload::deployment("adot-collector", "adot-system")
        .shown_as("adot")
        .eks_addon("adot"),
    KnownWorkload::deployment("cloudwatch-observability-operator", "amazon-cloudwatch")
        .shown_as("Amazon CloudWatch Observability")
        .eks_addon("amazon-cloudwatch-observability"),
    KnownWorkload::deployment("sagemaker-hyperpod-task-governance", "kube-system")
        .shown_as("Amazon SageMaker HyperPod task governance")
        .eks_addon("amazon-sagemaker-hyperpod-taskgovernance"),
    KnownWorkload::daemonset("aws-guardduty-agent", "amazon-guardduty")
        .shown_as("Amazon GuardDuty EKS Runtime Monitoring")
        .eks_addon("aws-guardduty-agent"),
    KnownWorkload::deployment("mountpoint-s3-csi-controller", "kube-system")
        .shown_as("Mountpoint for Amazon S3 CSI Driver")
        .eks_addon("aws-mountpoint-s3-csi-driver"),
    KnownWorkload::daemonset("aws-network-flow-monitor-agent", "aws-network-flow-monitor")
        .shown_as("AWS Network Flow Monitor Agent")
        .eks_addon("aws-network-flow-monitoring-agent"),
    KnownWorkload::daemonset("node-monitoring-agent", "kube-system")
        .shown_as("Node monitoring agent")
        .eks_addon("eks-node-monitoring-agent"),
    KnownWorkload::daemonset("eks-pod-identity-agent", "kube-system")
        .shown_as("Amazon EKS Pod Identity Agent")
        .eks_addon("eks-pod-identity-agent"),
    KnownWorkload::deployment("snapshot-controller", "kube-system")
        .shown_as("CSI Snapshot Controller")
        .eks_addon("snapshot-controller"),
    KnownWorkload::deployment("ebs-csi-controller", "kube-system")
        .shown_as("ebs-csi-driver")
        .eks_addon("aws-ebs-csi-driver"),
    KnownWorkload::deployment("efs-csi-controller", "kube-system")
        .shown_as("efs-csi-driver")
        .eks_addon("aws-efs-csi-driver"),
];

/// Core components, reported under their EKS add-on names.
const CORE_COMPONENTS: &[KnownWorkload] = &[
    KnownWorkload::deployment("coredns", "kube-system")
        .shown_as("coredns")
        .eks_addon("coredns"),
    KnownWorkload::daemonset("kube-proxy", "kube-system")
        .shown_as("kube-proxy")
        .eks_addon("kube-proxy"),
    KnownWorkload::daemonset("aws-node", "kube-system")
        .shown_as("vpc-cni")
        .eks_addon("vpc-cni"),
];

fn installed_as_addon(workload: &KnownWorkload, installed: &[InstalledAddon]) -> bool {
    workload
        .eks_addon
        .is_some_and(|addon| installed.iter().any(|a| a.name == addon))
}

/// First container image and the labels of a workload.
struct WorkloadFacts {
    image: Option<String>,
    labels: BTreeMap<String, String>,
}

impl WorkloadFacts {
    fn from_parts(
        labels: Option<BTreeMap<String, String>>,
        template: Option<&PodTemplateSpec>,
    ) -> Self {
        let image = template
            .and_then(|t| t.spec.as_ref())
            .and_then(|spec| spec.containers.first())
            .and_then(|c| c.image.clone());
        Self {
            image,
            labels: labels.unwrap_or_default(),
        }
    }
}

/// [`ClusterInspector`] backed by the active kubeconfig context.
#[derive(Clone)]
pub struct KubeInspector {
    client: Client,
}

impl KubeInspector {
    /// Connect with the default kubeconfig and check the API server answers.
    pub async fn connect() -> PlannerResult<Self> {
        let client = Client::try_default().await?;
        let version = client.apiserver_version().await?;
        info!(
            server_version = %version.git_version,
            "Connected to Kubernetes API server"
        );
        Ok(Self { client })
    }

    async fn workload(&self, workload: &KnownWorkload) -> PlannerResult<Option<WorkloadFacts>> {
        let facts = match workload.kind {
            WorkloadKind::Deployment => {
                let api: Api<Deployment> = Api::namespaced(self.client.clone(), workload.namespace);
                api.get_opt(workload.name).await?.map(|d| {
                    WorkloadFacts::from_parts(d.metadata.labels, d.spec.as_ref().map(|s| &s.template))
                })
            }
            WorkloadKind::DaemonSet => {
                let api: Api<DaemonSet> = Api::namespaced(self.client.clone(), workload.namespace);
                api.get_opt(workload.name).await?.map(|d| {
                    WorkloadFacts::from_parts(d.metadata.labels, d.spec.as_ref().map(|s| &s.template))
                })
            }
        };
        Ok(facts)
    }
}

#[async_trait]
impl ClusterInspector for KubeInspector {
    async fn node_versions(&self) -> PlannerResult<NodeVersions> {
        let nodes: Api<Node> = Api::all(self.client.clone());

        let mut self_managed = Vec::new();
        let mut karpenter = Vec::new();
        let mut continue_token: Option<String> = None;

        loop {
            let mut params = ListParams::default().limit(NODE_PAGE_SIZE);
            if let Some(token) = continue_token.take() {
                params = params.continue_token(&token);
            }
            let page = nodes.list(&params).await?;

            for node in page.items {
                let Some(version) = node
                    .status
                    .and_then(|s| s.node_info)
                    .map(|i| i.kubelet_version)
                else {
                    continue;
                };
                match classify_node(&node.metadata.labels.unwrap_or_default()) {
                    NodeKind::Karpenter => karpenter.push(version),
                    NodeKind::SelfManaged => self_managed.push(version),
                    NodeKind::ManagedNodegroup => {}
                }
            }

            match page.metadata.continue_.filter(|t| !t.is_empty()) {
                Some(token) => continue_token = Some(token),
                None => break,
            }
        }
        debug!(
            self_managed = self_managed.len(),
            karpenter = karpenter.len(),
            "Classified cluster nodes"
        );

        Ok(NodeVersions {
            min_self_managed_version: min_version(self_managed.iter().map(String::as_str))
                .map(str::to_string),
            min_karpenter_version: min_version(karpenter.iter().map(String::as_str))
                .map(str::to_string),
            self_managed_count: self_managed.len() as u32,
            karpenter_count: karpenter.len() as u32,
        })
    }

    async fn opensource_addons(&self, installed: &[InstalledAddon]) -> Vec<OpenSourceAddon> {
        let mut addons = Vec::new();
        for workload in OPENSOURCE_ADDONS {
            if installed_as_addon(workload, installed) {
                debug!(addon = workload.name, "Installed as EKS add-on, skipping");
                continue;
            }
            match self.workload(workload).await {
                Ok(Some(WorkloadFacts {
                    image: Some(image),
                    labels,
                })) => {
                    let mut addon = OpenSourceAddon {
                        name: workload.reported_name().to_string(),
                        version: image_version(&image),
                        ..OpenSourceAddon::default()
                    };
                    apply_helm_labels(&labels, &mut addon);
                    addons.push(addon);
                }
                Ok(_) => {}
                Err(e) => warn!(
                    workload = workload.name,
                    namespace = workload.namespace,
                    error = %e,
                    "Failed to read workload"
                ),
            }
        }
        addons
    }

    async fn core_components(&self, installed: &[InstalledAddon]) -> Vec<ComponentVersion> {
        let mut components = Vec::new();
        for workload in CORE_COMPONENTS {
            if installed_as_addon(workload, installed) {
                continue;
            }
            match self.workload(workload).await {
                Ok(Some(WorkloadFacts {
                    image: Some(image), ..
                })) => components.push(ComponentVersion {
                    name: workload.reported_name().to_string(),
                    version: image_version(&image),
                }),
                Ok(_) => {}
                Err(e) => warn!(component = workload.name, error = %e, "Failed to read core component"),
            }
        }
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_classify_node() {
        assert_eq!(
            classify_node(&labels(&[("karpenter.sh/nodepool", "default")])),
            NodeKind::Karpenter
        );
        assert_eq!(
            classify_node(&labels(&[("karpenter.sh/provisioner-name", "default")])),
            NodeKind::Karpenter
        );
        assert_eq!(
            classify_node(&labels(&[("eks.amazonaws.com/nodegroup-image", "ami-123")])),
            NodeKind::ManagedNodegroup
        );
        assert_eq!(
            classify_node(&labels(&[("kubernetes.io/os", "linux")])),
            NodeKind::SelfManaged
        );
        assert_eq!(classify_node(&BTreeMap::new()), NodeKind::SelfManaged);
    }

    #[test]
    fn test_karpenter_wins_over_nodegroup_label() {
        let node = labels(&[
            ("karpenter.sh/nodepool", "default"),
            ("eks.amazonaws.com/nodegroup", "ng-a"),
        ]);
        assert_eq!(classify_node(&node), NodeKind::Karpenter);
    }

    #[test]
    fn test_image_version() {
        assert_eq!(
            image_version("registry.k8s.io/metrics-server/metrics-server:v0.6.3"),
            "0.6.3"
        );
        assert_eq!(
            image_version("602401143452.dkr.ecr.us-west-2.amazonaws.com/eks/coredns:v1.10.1-eksbuild.4"),
            "1.10.1-eksbuild.4"
        );
        assert_eq!(image_version("localhost:5000/app:1.2"), "1.2");
        assert_eq!(image_version("nginx"), UNKNOWN_VERSION);
    }

    #[test]
    fn test_helm_labels() {
        let mut addon = OpenSourceAddon::default();
        apply_helm_labels(
            &labels(&[
                ("app.kubernetes.io/managed-by", "Helm"),
                ("helm.sh/chart", "aws-load-balancer-controller-1.6.2"),
                ("app.kubernetes.io/version", "v2.6.2"),
            ]),
            &mut addon,
        );
        assert!(addon.helm_installed);
        assert_eq!(addon.helm_chart_name.as_deref(), Some("aws-load-balancer-controller"));
        assert_eq!(addon.helm_chart_version.as_deref(), Some("1.6.2"));
        assert_eq!(addon.helm_app_version.as_deref(), Some("v2.6.2"));
    }

    #[test]
    fn test_helm_app_version_falls_back_to_instance() {
        let mut addon = OpenSourceAddon::default();
        apply_helm_labels(
            &labels(&[
                ("helm.sh/chart", "karpenter"),
                ("app.kubernetes.io/instance", "karpenter"),
            ]),
            &mut addon,
        );
        assert!(addon.helm_installed);
        assert_eq!(addon.helm_chart_name, None);
        assert_eq!(addon.helm_app_version.as_deref(), Some("karpenter"));
    }

    #[test]
    fn test_non_helm_workload_untouched() {
        let mut addon = OpenSourceAddon::default();
        apply_helm_labels(&labels(&[("app.kubernetes.io/version", "1.0")]), &mut addon);
        assert_eq!(addon, OpenSourceAddon::default());
    }

    #[test]
    fn test_catalogue_skips_eks_addons() {
        let installed = vec![InstalledAddon {
            name: "aws-ebs-csi-driver".to_string(),
            version: "v1.25.0-eksbuild.1".to_string(),
        }];
        let skipped: Vec<&str> = OPENSOURCE_ADDONS
            .iter()
            .filter(|w| installed_as_addon(w, &installed))
            .map(KnownWorkload::reported_name)
            .collect();
        assert_eq!(skipped, vec!["ebs-csi-driver"]);
    }

    #[test]
    fn test_core_components_use_addon_names() {
        let names: Vec<&str> = CORE_COMPONENTS.iter().map(KnownWorkload::reported_name).collect();
        assert_eq!(names, vec!["coredns", "kube-proxy", "vpc-cni"]);
    }
}
