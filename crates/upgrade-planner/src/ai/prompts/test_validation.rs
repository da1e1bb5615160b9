//! Post-upgrade test advice prompt template.

use serde::Serialize;

use super::PromptTemplate;

/// Context for the test-validation prompt (no inputs).
#[derive(Debug, Clone, Default, Serialize)]
pub struct TestValidationContext {}

/// Get the test-validation template.
pub fn template() -> PromptTemplate {
    PromptTemplate::new(super::ids::TEST_VALIDATION, SYSTEM_PROMPT, USER_PROMPT)
        .with_description("Post-upgrade test recommendations")
}

const SYSTEM_PROMPT: &str = r"你是一位Kubernetes和Amazon EKS技术专家，请根据EKS升级最佳实践，为用户提供一个简略的EKS版本升级后的测试建议。

<要求>
- 请遵循EKS升级最佳实践
- EKS控制面版本无法回退
- 除了专业名称、代码、命令行之外，请使用简体中文输出
</要求>

<风格>严谨，专业客观</风格>

输出模版（Markdown）：
## 测试验证
";

const USER_PROMPT: &str = "好的，我将生成一份针对EKS版本升级的测试建议。";
