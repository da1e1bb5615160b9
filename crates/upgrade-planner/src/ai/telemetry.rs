//! Rough cost and latency accounting for model calls.
//!
//! Token counts are whitespace-delimited word counts. They only feed the
//! log line and never influence control flow.

use std::time::Duration;

/// Per-token prices in USD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostRates {
    pub input_per_token: f64,
    pub output_per_token: f64,
}

impl CostRates {
    pub const fn new(input_per_token: f64, output_per_token: f64) -> Self {
        Self {
            input_per_token,
            output_per_token,
        }
    }

    /// Estimated cost of one call.
    pub fn estimate(&self, input_tokens: usize, output_tokens: usize) -> f64 {
        input_tokens as f64 * self.input_per_token + output_tokens as f64 * self.output_per_token
    }
}

/// Crude token estimate: number of whitespace-separated words.
pub fn estimate_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Metrics for one successful invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CallMetrics {
    pub latency: Duration,
    pub request_tokens: usize,
    pub response_tokens: usize,
    pub estimated_cost: Option<f64>,
}

impl CallMetrics {
    pub fn new(
        latency: Duration,
        request_tokens: usize,
        response_tokens: usize,
        rates: Option<CostRates>,
    ) -> Self {
        Self {
            latency,
            request_tokens,
            response_tokens,
            estimated_cost: rates.map(|r| r.estimate(request_tokens, response_tokens)),
        }
    }

    pub fn log(&self, model_id: &str) {
        match self.estimated_cost {
            Some(cost) => tracing::info!(
                model_id,
                latency_secs = self.latency.as_secs_f64(),
                request_tokens = self.request_tokens,
                response_tokens = self.response_tokens,
                estimated_cost_usd = %format!("${cost:.6}"),
                "Model call metrics"
            ),
            None => tracing::info!(
                model_id,
                latency_secs = self.latency.as_secs_f64(),
                request_tokens = self.request_tokens,
                response_tokens = self.response_tokens,
                "Model call metrics (no cost estimate for this vendor)"
            ),
        }
    }
}
