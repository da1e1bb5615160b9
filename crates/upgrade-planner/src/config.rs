//! Planner configuration.
//!
//! Defaults reproduce the behaviour of the command line tool without a
//! config file. A TOML file passed with `--config` can override any field.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{PlannerError, PlannerResult};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Model invocation settings
    #[serde(default)]
    pub invoker: InvokerConfig,

    /// Reference document URL overrides, keyed by document name
    #[serde(default)]
    pub docs: BTreeMap<String, String>,
}

impl PlannerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> PlannerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PlannerError::Config {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| PlannerError::Config {
            reason: format!("failed to parse {}: {e}", path.display()),
        })?;
        config.invoker.validate()?;
        Ok(config)
    }

    /// Load from an optional path, falling back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> PlannerResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

/// Settings for the model invoker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokerConfig {
    /// Retries allowed after the first throttled attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry, in seconds
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: f64,

    /// Multiplier applied to the delay after every retry
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Fail instead of guessing a request shape for unknown model vendors
    #[serde(default)]
    pub strict_vendor: bool,

    /// Log full request and response bodies
    #[serde(default)]
    pub debug: bool,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_interval_secs() -> f64 {
    30.0
}

const fn default_backoff_factor() -> f64 {
    2.0
}

const fn default_temperature() -> f32 {
    0.1
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_interval_secs: default_retry_interval_secs(),
            backoff_factor: default_backoff_factor(),
            temperature: default_temperature(),
            strict_vendor: false,
            debug: false,
        }
    }
}

impl InvokerConfig {
    /// Initial backoff delay.
    pub fn retry_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_interval_secs.max(0.0)).unwrap_or(Duration::MAX)
    }

    /// Reject values that cannot describe a backoff schedule.
    pub fn validate(&self) -> PlannerResult<()> {
        for (field, value) in [
            ("retry_interval_secs", self.retry_interval_secs),
            ("backoff_factor", self.backoff_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PlannerError::Config {
                    reason: format!("invoker.{field} must be a finite, non-negative number, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Enable or disable debug logging of bodies.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
