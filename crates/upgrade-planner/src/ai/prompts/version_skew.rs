//! Version skew prompt template.
//!
//! Checks kubelet and kube-proxy versions against the skew policy for the
//! target control plane.

use serde::Serialize;

use super::PromptTemplate;
use crate::entities::NodegroupInfo;

/// Context for the version-skew prompt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VersionSkewContext {
    pub current_version: String,
    pub target_version: String,
    /// `{"version", "count"}` JSON, absent when no self-managed nodes were seen
    pub self_managed_nodes: Option<String>,
    /// `{"version", "count"}` JSON, absent when no Karpenter nodes were seen
    pub karpenter_nodes: Option<String>,
    pub nodegroups: Vec<NodegroupInfo>,
    /// `{"version"}` JSON, absent when unknown
    pub kube_proxy: Option<String>,
}

/// Get the version-skew template.
pub fn template() -> PromptTemplate {
    PromptTemplate::new(super::ids::VERSION_SKEW, SYSTEM_PROMPT, USER_PROMPT)
        .with_description("Node and kube-proxy version skew advice")
}

const SYSTEM_PROMPT: &str = r"你是一位Kubernetes和Amazon EKS专家，请根据用户提供的节点和kube-proxy版本信息，逐步思考并提供节点和kube-proxy的升级建议。

<风格>严谨，专业客观</风格>

<参考文档>
Kubernetes 版本偏差策略：
- kubelet must not be newer than kube-apiserver.
- kubelet may be up to three minor versions older than kube-apiserver (kubelet < 1.25 may only be up to two minor versions older than kube-apiserver).
- kube-proxy must not be newer than kube-apiserver.
- kube-proxy may be up to three minor versions older than kube-apiserver (kube-proxy < 1.25 may only be up to two minor versions older than kube-apiserver).
</参考文档>

<要求>
- 检查当前节点和kube-proxy版本是否与目标Kubernetes版本兼容，若不兼容请建议升级到与当前控制面版本一致
- 请遵循Kubernetes版本偏差策略
- 请遵循EKS升级最佳实践
- 无需提供具体的升级方法
- 无需提供除了节点和kube-proxy之外的其它组件的建议
- 除了专业名称、代码、命令行之外，请使用简体中文输出
</要求>

输出模版（Markdown）：
### Version Skew

当前存在与目标版本不兼容的节点，建议在升级控制面之前更新工作节点到当前控制面版本。。。

当前 kube-proxy  与目标版本不兼容，建议在升级控制面之前更新 kube-proxy 到当前控制面版本。。。
";

const USER_PROMPT: &str = r"当前控制面版本：{{current_version}}
目标EKS版本：{{target_version}}
自管理节点版本信息：{{or_none self_managed_nodes}}
Karpenter节点版本信息：{{or_none karpenter_nodes}}
托管节点组版本信息：{{{json nodegroups}}}
Kube-proxy版本信息：{{or_none kube_proxy}}";
