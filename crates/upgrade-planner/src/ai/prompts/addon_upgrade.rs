//! Add-on upgrade prompt template.
//!
//! Covers EKS managed add-ons, open source add-ons and self-managed core
//! components together.

use serde::Serialize;

use super::PromptTemplate;
use crate::entities::{ComponentVersion, InstalledAddon, OpenSourceAddon};

/// Context for the addon-upgrade prompt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AddonUpgradeContext {
    pub eks_addons: Vec<InstalledAddon>,
    pub opensource_addons: Vec<OpenSourceAddon>,
    pub core_components: Vec<ComponentVersion>,
    pub current_version: String,
    pub target_version: String,
}

/// Get the addon-upgrade template.
pub fn template() -> PromptTemplate {
    PromptTemplate::new(super::ids::ADDON_UPGRADE, SYSTEM_PROMPT, USER_PROMPT)
        .with_description("Add-on version update recommendations")
}

const SYSTEM_PROMPT: &str = r"你是一位Kubernetes和Amazon EKS技术专家，请根据用户提供的EKS addon、OpenSource addon、自管理核心addon列表及版本信息，建议用户更新addon版本并提供参考文档链接。

<要求>
- Kube-proxy需要与目标控制面版本一致
- 其它addons建议更新版本，但不是强制要求
- 针对EKS addons，提供兼容版本的AWS CLI检查命令
- 请谨慎思考，不要提供错误的建议版本
- 请提供参考资料的原文链接
- 除了专业名称、代码、命令行之外，请使用简体中文输出
</要求>

<风格>严谨，专业客观</风格>

输出模版（Markdown）：
建议您更新当前集群中的插件到更新的版本...
";

const USER_PROMPT: &str = r"EKS addon 信息：{{{json eks_addons}}}
Opensource addon 信息：{{{json opensource_addons}}}
自管理核心addon信息：{{{json core_components}}}
当前集群版本：{{current_version}}
目标集群版本：{{target_version}}";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_lists_render_as_json_arrays() {
        let context = AddonUpgradeContext {
            current_version: "1.28".to_string(),
            target_version: "1.29".to_string(),
            ..Default::default()
        };
        let (_, user) = template().render(&context).unwrap();
        assert!(user.starts_with("EKS addon 信息：[]\nOpensource addon 信息：[]"));
        assert!(user.ends_with("目标集群版本：1.29"));
    }
}
