//! Version change impact prompt template.
//!
//! Asks for pre-upgrade checks covering every release between the current
//! and target versions.

use serde::Serialize;

use super::PromptTemplate;

/// Context for the version-changes prompt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VersionChangesContext {
    /// Standard support release notes
    pub standard_versions: String,
    /// Extended support release notes
    pub extended_versions: String,
    pub current_version: String,
    pub target_version: String,
}

/// Get the version-changes template.
pub fn template() -> PromptTemplate {
    PromptTemplate::new(super::ids::VERSION_CHANGES, SYSTEM_PROMPT, USER_PROMPT)
        .with_description("Impact assessment of changes between two EKS versions")
}

const SYSTEM_PROMPT: &str = r"你是一位Kubernetes和Amazon EKS技术专家，请根据用户提供的当前及目标EKS版本信息，逐步思考并制定一份升级前检查建议。

<要求>
- 提供对注意事项的解析
- 提供详细的，可操作的检查方法
- 提供详细的，可操作的应对措施
- 使用kubent或pluto命令检查API Version
- 除了专业名称、代码、命令行之外，请使用简体中文输出
- 不要考虑<=当前版本，或者>目标版本的变更
- 不要考虑新增功能或特性
- 不要使用kubectl get命令检查API Version
- 无需提供备份，升级或回退操作步骤
</要求>

<参考文档>
- Standard version版本信息: {{standard_versions}}
- Extended support version版本信息: {{extended_versions}}
</参考文档>

<风格>严谨，专业客观</风格>

输出模版（Markdown）：
好的，我将输出EKS版本变更影响评估，但不会包含新增的功能或特性。

当前EKS集群版本：

目标EKS集群版本：

### EKS 1.x 升级至 1.x 版本变更影响评估

1 EKS 1.x 关键变更
...

2 EKS 1.x 关键变更
...
";

const USER_PROMPT: &str = r"当前EKS集群版本：{{current_version}}
目标EKS集群版本：{{target_version}}";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_lists_both_versions() {
        let context = VersionChangesContext {
            current_version: "1.27".to_string(),
            target_version: "1.29".to_string(),
            ..Default::default()
        };
        let (_, user) = template().render(&context).unwrap();
        assert_eq!(user, "当前EKS集群版本：1.27\n目标EKS集群版本：1.29");
    }
}
