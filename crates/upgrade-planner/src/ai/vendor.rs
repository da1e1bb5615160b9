//! Vendor adapters and the dispatch table that selects them.
//!
//! Each adapter knows how to shape a request body for one model family,
//! how to pull completion text back out, and what a token costs. New vendors
//! are added by registering another adapter.

use std::sync::Arc;

use serde_json::{json, Value};

use super::anthropic::{ClaudeAdapter, BEDROCK_ANTHROPIC_VERSION};
use super::deepseek::DeepSeekAdapter;
use super::provider::{ChatMessage, PromptRequest};
use super::response::{extract_completion, Completion};
use super::telemetry::CostRates;

/// Request/response adapter for one model vendor.
pub trait VendorAdapter: Send + Sync {
    /// Vendor tag (e.g., "claude", "deepseek").
    fn tag(&self) -> &'static str;

    /// Whether this adapter handles the (lower-cased) model identifier.
    fn matches(&self, model_id_lower: &str) -> bool;

    /// Build the vendor-specific request body.
    fn build_request(&self, request: &PromptRequest) -> Value;

    /// Extract completion text from the vendor response body.
    fn parse_response(&self, body: &Value) -> Result<Completion, String> {
        extract_completion(body)
    }

    /// Per-token prices, if known.
    fn cost_rates(&self) -> Option<CostRates> {
        None
    }
}

/// Adapter used when no registered vendor matches.
///
/// Sends separate system and user messages with the Bedrock Anthropic
/// version tag and no token cap.
pub struct FallbackAdapter;

impl VendorAdapter for FallbackAdapter {
    fn tag(&self) -> &'static str {
        "unknown"
    }

    fn matches(&self, _model_id_lower: &str) -> bool {
        true
    }

    fn build_request(&self, request: &PromptRequest) -> Value {
        json!({
            "anthropic_version": BEDROCK_ANTHROPIC_VERSION,
            "messages": [
                ChatMessage::system(request.system.clone()),
                ChatMessage::user(request.user.clone()),
            ],
            "temperature": request.temperature,
        })
    }
}

/// Outcome of looking up an adapter for a model identifier.
#[derive(Clone)]
pub struct Resolved {
    pub adapter: Arc<dyn VendorAdapter>,
    /// False when the fallback adapter was chosen
    pub recognized: bool,
}

/// Ordered table of vendor adapters.
pub struct VendorRegistry {
    adapters: Vec<Arc<dyn VendorAdapter>>,
    fallback: Arc<dyn VendorAdapter>,
}

impl VendorRegistry {
    /// Create an empty registry (everything resolves to the fallback).
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
            fallback: Arc::new(FallbackAdapter),
        }
    }

    /// Create a registry with the built-in vendors registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ClaudeAdapter));
        registry.register(Arc::new(DeepSeekAdapter));
        registry
    }

    /// Register an adapter. Earlier registrations win on overlap.
    pub fn register(&mut self, adapter: Arc<dyn VendorAdapter>) {
        self.adapters.push(adapter);
    }

    /// Find the adapter for a model identifier (case-insensitive).
    pub fn resolve(&self, model_id: &str) -> Resolved {
        let lower = model_id.to_lowercase();
        self.adapters
            .iter()
            .find(|a| a.matches(&lower))
            .map(|a| Resolved {
                adapter: Arc::clone(a),
                recognized: true,
            })
            .unwrap_or_else(|| Resolved {
                adapter: Arc::clone(&self.fallback),
                recognized: false,
            })
    }
}

impl Default for VendorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
