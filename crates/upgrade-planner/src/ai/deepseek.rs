//! DeepSeek models on Bedrock.

use serde::Serialize;
use serde_json::Value;

use super::provider::{ChatMessage, PromptRequest};
use super::telemetry::CostRates;
use super::vendor::VendorAdapter;

/// Maximum output tokens requested from DeepSeek
const MAX_TOKENS: u32 = 4096;

const RATES: CostRates = CostRates::new(0.000_001_35, 0.000_005_4);

#[derive(Debug, Serialize)]
struct DeepSeekRequest {
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

/// DeepSeek adapter: separate system and user messages.
pub struct DeepSeekAdapter;

impl VendorAdapter for DeepSeekAdapter {
    fn tag(&self) -> &'static str {
        "deepseek"
    }

    fn matches(&self, model_id_lower: &str) -> bool {
        model_id_lower.contains("deepseek")
    }

    fn build_request(&self, request: &PromptRequest) -> Value {
        let body = DeepSeekRequest {
            messages: vec![
                ChatMessage::system(request.system.clone()),
                ChatMessage::user(request.user.clone()),
            ],
            temperature: request.temperature,
            max_tokens: MAX_TOKENS,
        };
        serde_json::to_value(body).unwrap_or(Value::Null)
    }

    fn cost_rates(&self) -> Option<CostRates> {
        Some(RATES)
    }
}
