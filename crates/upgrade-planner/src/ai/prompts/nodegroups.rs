//! Data plane upgrade prompt template.

use serde::Serialize;

use super::PromptTemplate;
use crate::entities::NodegroupInfo;

/// Context for the nodegroups prompt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodegroupsContext {
    /// Managed node group update guide
    pub update_nodegroup: String,
    pub nodegroups: Vec<NodegroupInfo>,
    pub fargate_profiles: Vec<String>,
    pub self_managed_nodes: Option<String>,
    pub karpenter_nodes: Option<String>,
}

impl NodegroupsContext {
    /// True when there is no data plane capacity of any kind to upgrade.
    pub fn is_empty(&self) -> bool {
        self.nodegroups.is_empty()
            && self.fargate_profiles.is_empty()
            && self.self_managed_nodes.is_none()
            && self.karpenter_nodes.is_none()
    }
}

/// Get the nodegroups template.
pub fn template() -> PromptTemplate {
    PromptTemplate::new(super::ids::NODEGROUPS, SYSTEM_PROMPT, USER_PROMPT)
        .with_description("Node group, self-managed, Karpenter and Fargate upgrade steps")
}

const SYSTEM_PROMPT: &str = r"你是一位Kubernetes和Amazon EKS技术专家，请根据用户提供的EKS节点组及Fargate Profile信息，逐步思考并制定一份节点组及Fargate升级步骤。

<要求>
- 若集群存在节点组，则为每个节点组提供升级命令
- 若节点组数量超过3个，可以提供指导步骤而无需穷举所有节点组
- 若集群不存在Fargate profile，则无需提供Fargate升级方法
- 若集群不存在自管理节点或Kapenter节点，则无需提供这两种节点的升级方法
- 除了专业名称、代码、命令行之外，请使用简体中文输出
</要求>

<参考文档>
- 更新集群的托管式节点组: {{update_nodegroup}}
</参考文档>

<风格>严谨，专业客观</风格>

输出模版（Markdown）：
### 集群托管节点组列表
1 ...
2 ...

### 托管节点组升级方法
蓝绿方式升级（推荐）
...
原节点组升级
...

### 自管理节点升级方法

### Karpenter节点升级方法

### 节点升级注意事项
节点升级时所有节点会被替换，请确保您没有对节点的依赖配置（例如IP地址）；
删除旧节点组时需注意...
...

### Fargate Pod升级方法

### Fargate Pod升级注意事项
";

const USER_PROMPT: &str = r"托管节点组列表：{{{json nodegroups}}}
Fargate Profile列表：{{{json fargate_profiles}}}
自管理节点信息：{{or_none self_managed_nodes}}
Karpenter节点信息：{{or_none karpenter_nodes}}";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_empty() {
        let mut context = NodegroupsContext::default();
        assert!(context.is_empty());

        context.karpenter_nodes = Some(r#"{"version":"v1.29.0","count":3}"#.to_string());
        assert!(!context.is_empty());
    }

    #[test]
    fn test_render() {
        let context = NodegroupsContext {
            update_nodegroup: "NODEGROUP DOC".to_string(),
            fargate_profiles: vec!["fp-1".to_string()],
            ..Default::default()
        };
        let (system, user) = template().render(&context).unwrap();
        assert!(system.contains("更新集群的托管式节点组: NODEGROUP DOC"));
        assert!(user.starts_with("托管节点组列表：[]\nFargate Profile列表：[\n  \"fp-1\"\n]"));
        assert!(user.ends_with("Karpenter节点信息：无"));
    }
}
