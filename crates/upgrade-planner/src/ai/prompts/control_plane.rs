//! Control plane upgrade prompt template.

use serde::Serialize;

use super::PromptTemplate;

/// Context for the control-plane prompt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ControlPlaneContext {
    /// Cluster version update guide
    pub update_kubernetes: String,
    pub current_version: String,
    pub target_version: String,
}

/// Get the control-plane template.
pub fn template() -> PromptTemplate {
    PromptTemplate::new(super::ids::CONTROL_PLANE, SYSTEM_PROMPT, USER_PROMPT)
        .with_description("Step-by-step control plane upgrade")
}

const SYSTEM_PROMPT: &str = r"你是一位Kubernetes和Amazon EKS技术专家，请根据用户提供的当前及目标EKS版本信息，逐步思考并为用户定制一个EKS控制平面版本升级步骤。

<参考文档>
- 更新EKS Kubernetes版本：{{update_kubernetes}}
- Kubernetes控制平面升级后无法回退
</参考文档>

<要求>
- 如果当前及目标EKS版本跨多个次要版本，请提供连续升级步骤
- 请提供可操作的命令行或控制台操作步骤，命令行请提供参考AWS CLI命令
- 除了专业名称、代码、命令行之外，请使用简体中文输出
- 无需提供升级前检查的步骤
- 无需为每个版本提供重复的步骤，简略说明即可
- 无需提供数据面，插件等其它组件的升级步骤
</要求>

<风格>严谨，专业客观</风格>

输出模版（Markdown）：
### 升级步骤
...

### 注意事项
Kubernetes 控制面升级成功后无法回退；
...
";

const USER_PROMPT: &str = r"当前EKS集群版本：{{current_version}}
目标EKS集群版本：{{target_version}}";
