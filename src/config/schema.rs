//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files, and
//! every section has defaults so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::resilience::{
    BreakerConfigError, CircuitBreaker, FailureKind, RetryConfigError, RetryPolicy,
};

/// Root configuration for the POI locator service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    pub listener: ListenerConfig,

    /// Upstream geocoding (Overpass) settings.
    pub upstream: UpstreamConfig,

    /// Retry policy for upstream searches.
    pub retries: RetryConfig,

    /// Circuit breaker guarding upstream searches.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Search result cache.
    pub cache: CacheConfig,

    /// Outbound notification settings.
    pub mailer: MailerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Whole-request timeout in seconds. Should exceed the worst-case
    /// retry sequence (attempts × upstream timeout + backoff delays).
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            request_timeout_secs: 90,
        }
    }
}

/// Upstream Overpass API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Interpreter endpoint URL.
    pub url: String,

    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,

    /// OSM `amenity` tag value to search for; also the POI category.
    pub amenity: String,

    /// User-Agent header sent upstream.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "https://overpass-api.de/api/interpreter".to_string(),
            timeout_secs: 20,
            amenity: "restaurant".to_string(),
            user_agent: concat!("poi-locator/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,

    /// Delay before the second attempt, in milliseconds.
    pub initial_delay_ms: u64,

    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_factor: f64,

    /// Failure kinds that are retried.
    pub retry_on: Vec<FailureKind>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            backoff_factor: 2.0,
            retry_on: FailureKind::TRANSIENT.to_vec(),
        }
    }
}

impl RetryConfig {
    /// Build the policy, labelled with `operation` for logs and metrics.
    pub fn build(&self, operation: &'static str) -> Result<RetryPolicy, RetryConfigError> {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_delay_ms),
            self.backoff_factor,
            self.retry_on.iter().copied(),
        )
        .map(|policy| policy.for_operation(operation))
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the breaker opens.
    pub failure_threshold: u32,

    /// How long the breaker stays open, in seconds.
    pub cooldown_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown_secs: 20,
        }
    }
}

impl CircuitBreakerConfig {
    /// Check the parameters without constructing a breaker.
    pub fn check(&self) -> Result<(), BreakerConfigError> {
        if self.failure_threshold == 0 {
            return Err(BreakerConfigError::ZeroThreshold);
        }
        Ok(())
    }

    pub fn build(&self, name: &'static str) -> Result<CircuitBreaker, BreakerConfigError> {
        self.check()?;
        CircuitBreaker::new(
            name,
            self.failure_threshold,
            Duration::from_secs(self.cooldown_secs),
        )
    }
}

/// Search cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Outbound notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MailerConfig {
    /// Sender address on outgoing messages.
    pub sender: String,

    /// Retry policy for delivery.
    pub retries: RetryConfig,

    /// Circuit breaker guarding delivery.
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            sender: "no-reply@localhost".to_string(),
            retries: RetryConfig {
                max_attempts: 3,
                initial_delay_ms: 4_000,
                backoff_factor: 2.0,
                retry_on: FailureKind::TRANSIENT.to_vec(),
            },
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
