//! Cluster summary prompt template.
//!
//! The only topic that consumes another topic's output: the version skew
//! analysis is passed in verbatim.

use serde::Serialize;

use super::PromptTemplate;
use crate::entities::NodegroupInfo;

/// Context for the cluster-summary prompt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClusterSummaryContext {
    pub cluster_name: String,
    pub current_version: String,
    pub target_version: String,
    pub nodegroups: Vec<NodegroupInfo>,
    pub self_managed_nodes: Option<String>,
    pub karpenter_nodes: Option<String>,
    pub fargate_profiles: Vec<String>,
    /// Output of the version skew topic
    pub version_skew: Option<String>,
    pub kube_proxy: Option<String>,
}

/// Get the cluster-summary template.
pub fn template() -> PromptTemplate {
    PromptTemplate::new(super::ids::CLUSTER_SUMMARY, SYSTEM_PROMPT, USER_PROMPT)
        .with_description("Cluster overview and upgrade strategy")
}

const SYSTEM_PROMPT: &str = r"你是一位Kubernetes和Amazon EKS技术专家，请根据用户提供的EKS版本信息，整理集群的概要信息。

<要求>
- 内容清晰，格式规范，可读性强
- 除了专业名称、代码、命令行之外，请使用简体中文输出
</要求>

<风格>严谨，专业客观</风格>

输出模版（Markdown）：
## 节点信息

集群名称：...

当前版本：...

目标版本：...

托管节点组：
1 ...
2 ...

自管理节点：...

Karpenter节点：...

Fargate profile：
1 ...
2 ...

### 总览
1. 版本偏差风险：...

2. 关键升级约束：...

3. 升级策略：...

### 备注
本升级计划由AI助手基于提供的集群信息自动生成。由于自动生成内容可能存在不完整或不准确的情况，强烈建议您在执行正式升级之前，先在测试环境中完整验证本升级计划的可行性与安全性。在测试环境验证通过后，再根据实际情况调整并在生产环境实施升级操作。
";

const USER_PROMPT: &str = r"集群名称：{{cluster_name}}
当前EKS集群版本：{{current_version}}
目标EKS集群版本：{{target_version}}
托管节点组列表：{{{json nodegroups}}}
自管理节点信息：{{or_none self_managed_nodes}}
Karpenter节点信息：{{or_none karpenter_nodes}}
Fargate profile列表：{{{json fargate_profiles}}}
版本偏差信息：{{or_none version_skew}}
Kube-proxy版本信息：{{or_none kube_proxy}}";
