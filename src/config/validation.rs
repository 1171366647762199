//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Build retry policies and breakers once so their constructors reject
//!   bad parameters before the service starts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>;
//!   it checks parameters without constructing breakers, so no metrics are emitted
//! - Nothing is clamped; misconfiguration fails loudly

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::resilience::{BreakerConfigError, RetryConfigError};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than 0")]
    Zero { field: &'static str },

    #[error("upstream.url: invalid URL '{value}': {reason}")]
    InvalidUrl { value: String, reason: String },

    #[error("upstream.amenity must not be empty")]
    EmptyAmenity,

    #[error("{section}: {source}")]
    Retry {
        section: &'static str,
        source: RetryConfigError,
    },

    #[error("{section}: {source}")]
    Breaker {
        section: &'static str,
        source: BreakerConfigError,
    },

    #[error("observability.log_level: unknown level '{0}'")]
    LogLevel(String),
}

/// Check every section, collecting all problems.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "listener.request_timeout_secs",
        });
    }

    if let Err(e) = url::Url::parse(&config.upstream.url) {
        errors.push(ValidationError::InvalidUrl {
            value: config.upstream.url.clone(),
            reason: e.to_string(),
        });
    }
    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "upstream.timeout_secs",
        });
    }
    if config.upstream.amenity.trim().is_empty() {
        errors.push(ValidationError::EmptyAmenity);
    }

    if let Err(source) = config.retries.build("overpass") {
        errors.push(ValidationError::Retry {
            section: "retries",
            source,
        });
    }
    if let Err(source) = config.circuit_breaker.check() {
        errors.push(ValidationError::Breaker {
            section: "circuit_breaker",
            source,
        });
    }
    if config.cache.ttl_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "cache.ttl_secs",
        });
    }

    if let Err(source) = config.mailer.retries.build("mailer") {
        errors.push(ValidationError::Retry {
            section: "mailer.retries",
            source,
        });
    }
    if let Err(source) = config.mailer.circuit_breaker.check() {
        errors.push(ValidationError::Breaker {
            section: "mailer.circuit_breaker",
            source,
        });
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::LogLevel(
            config.observability.log_level.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
