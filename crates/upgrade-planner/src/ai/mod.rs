//! Model integration for plan generation.
//!
//! This module provides:
//! - Model runtime abstraction (Amazon Bedrock in production)
//! - Vendor adapters for request/response shapes and pricing
//! - A retrying invoker that never fails
//! - Prompt template system with Handlebars

pub mod invoker;
pub mod prompts;
pub mod provider;
pub mod response;
pub mod telemetry;
pub mod vendor;

// Runtime and vendor implementations
pub mod anthropic;
pub mod bedrock;
pub mod deepseek;

// Re-exports
pub use bedrock::{BedrockRuntime, DEFAULT_BEDROCK_REGION};
pub use invoker::{is_throttled, ModelInvoker, Sleeper, TokioSleeper, FAILURE_PREFIX};
pub use prompts::{PromptManager, PromptTemplate};
pub use provider::{ChatMessage, ChatRole, ModelRuntime, PromptRequest, RuntimeError};
pub use response::{extract_completion, Completion};
pub use telemetry::{CallMetrics, CostRates};
pub use vendor::{VendorAdapter, VendorRegistry};
