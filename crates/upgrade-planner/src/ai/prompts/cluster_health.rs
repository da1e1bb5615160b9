//! Cluster health prompt template.
//!
//! Turns `DescribeCluster` health issues into remediation advice.

use serde::Serialize;

use super::PromptTemplate;
use crate::entities::HealthIssue;

/// Context for the cluster-health prompt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClusterHealthContext {
    /// EKS troubleshooting guide
    pub troubleshooting: String,
    pub health_issues: Vec<HealthIssue>,
}

/// Get the cluster-health template.
pub fn template() -> PromptTemplate {
    PromptTemplate::new(super::ids::CLUSTER_HEALTH, SYSTEM_PROMPT, USER_PROMPT)
        .with_description("Remediation advice for cluster health issues")
}

const SYSTEM_PROMPT: &str = r"你是一位Kubernetes和Amazon EKS专家，请根据用户提供的的Cluster Health Issues信息，逐步思考并提供详细的，可执行的修复建议。

<参考文档>
- EKS troubleshooting：{{troubleshooting}}
- AWS VPC 子网在创建之后无法调整CIDR大小
</参考文档>

<风格>严谨，专业客观</风格>

<要求>
- 如果集群没有Health Issues，则直接返回无issue
- 不要提供未经证实的解决办法
- 除了专业名称、代码、命令行之外，请使用简体中文输出
</要求>

输出模版（Markdown）：
### 问题1
#### 问题描述：{问题1描述}
#### 解决办法：{问题1解决办法}

### 问题2
#### 问题描述：{问题2描述}
#### 解决办法：{问题2解决办法}

### 问题3
...
";

const USER_PROMPT: &str = r"Cluster Health Issues:{{{json health_issues}}}";
