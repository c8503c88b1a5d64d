//! Queue configuration.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::AppResult;

/// Environment variable overriding [`QueueConfig::concurrent`].
pub const ENV_CONCURRENT: &str = "PACED_QUEUE_CONCURRENT";
/// Environment variable overriding [`QueueConfig::interval_ms`].
pub const ENV_INTERVAL_MS: &str = "PACED_QUEUE_INTERVAL_MS";
/// Environment variable overriding [`QueueConfig::start`].
pub const ENV_START: &str = "PACED_QUEUE_START";

/// Queue configuration, fixed for the lifetime of a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of tasks in flight at once.
    #[serde(alias = "concurrency", deserialize_with = "coerce_integer")]
    pub concurrent: usize,
    /// Minimum spacing between dispatch cycles, in milliseconds.
    #[serde(alias = "interval", deserialize_with = "coerce_integer")]
    pub interval_ms: u64,
    /// Whether enqueueing starts the queue automatically.
    pub start: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrent: 5,
            interval_ms: 500,
            start: true,
        }
    }
}

impl QueueConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency limit.
    #[must_use]
    pub const fn with_concurrent(mut self, concurrent: usize) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Set the pacing interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set whether enqueueing auto-starts the queue.
    #[must_use]
    pub const fn with_start(mut self, start: bool) -> Self {
        self.start = start;
        self
    }

    /// Pacing interval as a [`Duration`].
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrent == 0 {
            return Err("concurrent must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the environment, reading a `.env` file first
    /// when one is present. Unset variables keep their defaults.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();

        if let Ok(raw) = std::env::var(ENV_CONCURRENT) {
            cfg.concurrent = parse_integer(&raw)
                .with_context(|| format!("{ENV_CONCURRENT}={raw} is not a number"))?;
        }
        if let Ok(raw) = std::env::var(ENV_INTERVAL_MS) {
            cfg.interval_ms = parse_integer(&raw)
                .with_context(|| format!("{ENV_INTERVAL_MS}={raw} is not a number"))?;
        }
        if let Ok(raw) = std::env::var(ENV_START) {
            cfg.start = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_START}={raw} is not a boolean"))?;
        }

        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}

/// Parse an integer, truncating a fractional part. Negative values are refused.
fn parse_integer<N: TryFrom<u64>>(raw: &str) -> Option<N> {
    let raw = raw.trim();
    let whole = match raw.parse::<u64>() {
        Ok(n) => n,
        Err(_) => truncate(raw.parse::<f64>().ok()?)?,
    };
    N::try_from(whole).ok()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn truncate(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0 && value <= u64::MAX as f64).then(|| value.trunc() as u64)
}

/// Accept integers, floats and numeric strings, truncating to an integer.
fn coerce_integer<'de, D, N>(deserializer: D) -> Result<N, D::Error>
where
    D: Deserializer<'de>,
    N: TryFrom<u64>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(truncate))
            .and_then(|n| N::try_from(n).ok()),
        Value::String(s) => parse_integer(s),
        _ => None,
    };
    parsed.ok_or_else(|| serde::de::Error::custom(format!("expected a non-negative number, got {value}")))
}
