//! Deprecated API migration prompt template.

use serde::Serialize;

use super::PromptTemplate;
use crate::entities::DeprecatedApi;

/// Context for the deprecated-apis prompt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeprecatedApisContext {
    /// Kubernetes deprecation guide
    pub api_migration: String,
    pub deprecated_apis: Vec<DeprecatedApi>,
}

/// Get the deprecated-apis template.
pub fn template() -> PromptTemplate {
    PromptTemplate::new(super::ids::DEPRECATED_APIS, SYSTEM_PROMPT, USER_PROMPT)
        .with_description("Migration advice for deprecated API versions in use")
}

const SYSTEM_PROMPT: &str = r"你是一位Kubernetes和Amazon EKS技术专家，请根据用户提供的当前及目标EKS版本信息，以及正在使用的Deprecated API versions信息，逐步思考并制定一份API versions更新建议。

<要求>
- 如果集群没有使用deprecated API，则直接返回无issue
- API versions迁移的步骤
- 使用自动化转换工具
- 不要考虑不相关版本的信息，包括当前版本
- 不要使用kubectl get命令检查或验证API versions
- 只需要提供API versions更新建议，不要提供集群版本的升级步骤
- 除了专业名称、代码、命令行之外，请使用简体中文输出
</要求>

<参考文档>
- Kubernetes API migration guide: {{api_migration}}
</参考文档>

<风格>严谨，专业客观</风格>

输出模版（Markdown）：
### 正在使用的deprecated API version
### 使用deprecated API version的client agent
### 迁移方法
";

const USER_PROMPT: &str = r"正在使用的Deprecated API versions信息：{{{json deprecated_apis}}}";
