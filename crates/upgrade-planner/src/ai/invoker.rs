//! Model invoker with throttling-aware retries.
//!
//! [`ModelInvoker::invoke`] never fails: every problem is turned into text so
//! a failed topic still leaves a readable section in the plan.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::provider::{ModelRuntime, PromptRequest, RuntimeError};
use super::response::Completion;
use super::telemetry::{estimate_tokens, CallMetrics};
use super::vendor::VendorRegistry;
use crate::config::InvokerConfig;

/// Prefix of every failure text returned by the invoker
pub const FAILURE_PREFIX: &str = "调用LLM失败";

/// Error text fragments that mark a throttled call (matched case-insensitively)
const THROTTLE_MARKERS: &[&str] = &["too many requests", "throttling", "toomanyrequestsexception"];

/// Whether an error message indicates throttling.
pub fn is_throttled(message: &str) -> bool {
    let lower = message.to_lowercase();
    THROTTLE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Waits between retries.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Invokes hosted models, adapting requests per vendor.
pub struct ModelInvoker {
    runtime: Arc<dyn ModelRuntime>,
    registry: VendorRegistry,
    sleeper: Arc<dyn Sleeper>,
    config: InvokerConfig,
}

impl ModelInvoker {
    pub fn new(runtime: Arc<dyn ModelRuntime>, config: InvokerConfig) -> Self {
        Self {
            runtime,
            registry: VendorRegistry::with_defaults(),
            sleeper: Arc::new(TokioSleeper),
            config,
        }
    }

    /// Replace the vendor registry.
    pub fn with_registry(mut self, registry: VendorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the sleeper used between retries.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    /// Sampling temperature prompts should be sent with.
    pub fn temperature(&self) -> f32 {
        self.config.temperature
    }

    /// Run one prompt and return the completion text or a failure text.
    pub async fn invoke(&self, request: &PromptRequest) -> String {
        let resolved = self.registry.resolve(&request.model_id);
        if !resolved.recognized {
            if self.config.strict_vendor {
                error!(model_id = %request.model_id, "Unrecognized model vendor");
                return format!("{FAILURE_PREFIX}: 不支持的模型: {}", request.model_id);
            }
            warn!(
                model_id = %request.model_id,
                "Unrecognized model vendor, falling back to the Anthropic message format"
            );
        }
        let adapter = resolved.adapter;

        let body = adapter.build_request(request);
        let request_tokens = estimate_tokens(&request.system) + estimate_tokens(&request.user);

        let max_retries = self.config.max_retries;
        let mut attempt: u32 = 0;
        let mut delay = self.config.retry_interval();

        loop {
            if self.config.debug {
                debug!(model_id = %request.model_id, topic = %request.topic, body = %body, "Request body");
            } else {
                info!(model_id = %request.model_id, topic = %request.topic, "Invoking model");
            }

            let started = Instant::now();
            let err = match self.runtime.invoke_model(&request.model_id, &body).await {
                Ok(response) => {
                    let latency = started.elapsed();
                    if self.config.debug {
                        debug!(model_id = %request.model_id, body = %response, "Response body");
                    }
                    return match adapter.parse_response(&response) {
                        Ok(completion) => {
                            let text = match completion {
                                Completion::Text(text) => text,
                                Completion::Unrecognized(raw) => {
                                    warn!(model_id = %request.model_id, "Unknown response format, returning raw body");
                                    raw
                                }
                            };
                            CallMetrics::new(
                                latency,
                                request_tokens,
                                estimate_tokens(&text),
                                adapter.cost_rates(),
                            )
                            .log(&request.model_id);
                            text
                        }
                        Err(reason) => {
                            error!(model_id = %request.model_id, error = %reason, "Malformed model response");
                            format!("{FAILURE_PREFIX}: {reason}")
                        }
                    };
                }
                Err(err) => err,
            };

            error!(
                model_id = %request.model_id,
                attempt = attempt + 1,
                max_attempts = max_retries + 1,
                error = %err,
                "Model call failed"
            );

            if !is_throttled(&err.message) {
                log_chain(&err);
                return format!("{FAILURE_PREFIX}: {}", err.message);
            }

            if attempt >= max_retries {
                log_chain(&err);
                return format!(
                    "{FAILURE_PREFIX}: 达到最大重试次数 ({max_retries}): {}",
                    err.message
                );
            }

            info!(
                delay_secs = delay.as_secs_f64(),
                "Request throttled, waiting before retry"
            );
            self.sleeper.sleep(delay).await;
            attempt += 1;
            delay = next_delay(delay, self.config.backoff_factor);
        }
    }
}

/// `delay` scaled by `factor`, saturating at [`Duration::MAX`].
fn next_delay(delay: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor.max(0.0)).unwrap_or(Duration::MAX)
}

fn log_chain(err: &RuntimeError) {
    for (depth, cause) in err.chain.iter().enumerate() {
        error!(depth, cause = %cause, "Caused by");
    }
}
