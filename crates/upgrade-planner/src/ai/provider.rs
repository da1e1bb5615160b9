//! Model runtime trait and common request types.
//!
//! Defines the transport every hosted model is reached through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Role of a message in a vendor request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System message (sets context/behavior)
    System,
    /// User message (input)
    User,
}

/// A role-tagged message in a vendor request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// One prompt for one analysis topic.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    /// Topic label, used for logging
    pub topic: String,
    /// Fixed instructions for the topic
    pub system: String,
    /// Topic-specific data
    pub user: String,
    /// Target model identifier
    pub model_id: String,
    /// Sampling temperature
    pub temperature: f32,
}

impl PromptRequest {
    pub fn new(
        topic: impl Into<String>,
        model_id: impl Into<String>,
        system: impl Into<String>,
        user: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            topic: topic.into(),
            system: system.into(),
            user: user.into(),
            model_id: model_id.into(),
            temperature,
        }
    }
}

/// Failure reported by a model runtime.
///
/// Only the message text matters to callers: throttling is detected by
/// looking at it.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct RuntimeError {
    pub message: String,
    /// Error sources, outermost first
    pub chain: Vec<String>,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            chain: Vec::new(),
        }
    }

    /// Build from any error, keeping its source chain for diagnostics.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(inner) = source {
            chain.push(inner.to_string());
            source = inner.source();
        }
        Self {
            message: err.to_string(),
            chain,
        }
    }
}

/// Transport to a hosted model.
///
/// Receives a vendor-shaped JSON body and returns the vendor's JSON response.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    async fn invoke_model(&self, model_id: &str, body: &Value) -> Result<Value, RuntimeError>;
}
