//! Anthropic Claude models on Bedrock.

use serde::Serialize;
use serde_json::Value;

use super::provider::{ChatMessage, PromptRequest};
use super::telemetry::CostRates;
use super::vendor::VendorAdapter;

/// Bedrock protocol version tag for Anthropic models
pub const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Maximum output tokens requested from Claude
const MAX_TOKENS: u32 = 8191;

const RATES: CostRates = CostRates::new(0.000_003, 0.000_015);

/// Claude request body
#[derive(Debug, Serialize)]
struct ClaudeRequest {
    anthropic_version: &'static str,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

/// Claude adapter.
///
/// The system instructions are folded into a single user message.
pub struct ClaudeAdapter;

impl VendorAdapter for ClaudeAdapter {
    fn tag(&self) -> &'static str {
        "claude"
    }

    fn matches(&self, model_id_lower: &str) -> bool {
        model_id_lower.contains("anthropic") || model_id_lower.contains("claude")
    }

    fn build_request(&self, request: &PromptRequest) -> Value {
        let body = ClaudeRequest {
            anthropic_version: BEDROCK_ANTHROPIC_VERSION,
            max_tokens: MAX_TOKENS,
            messages: vec![ChatMessage::user(format!(
                "{}\n\n{}",
                request.system, request.user
            ))],
            temperature: request.temperature,
        };
        serde_json::to_value(body).unwrap_or(Value::Null)
    }

    fn cost_rates(&self) -> Option<CostRates> {
        Some(RATES)
    }
}
