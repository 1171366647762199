//! Outbound notifications (email).
//!
//! # Responsibilities
//! - Define the delivery seam (`Mailer`)
//! - Wrap any mailer with retry + circuit breaking (`ResilientMailer`)
//! - Provide a log-only mailer for deployments without a mail relay
//!
//! Delivery is synchronous; `ResilientMailer` uses the blocking retry mode.
//! Async callers should hand it to `tokio::task::spawn_blocking`.

use thiserror::Error;

use crate::config::validation::ValidationError;
use crate::config::MailerConfig;
use crate::observability::metrics;
use crate::resilience::{BreakerOpen, CircuitBreaker, Classify, FailureKind, RetryPolicy};

/// A plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Email {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Delivery failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotifyError {
    /// Relay unreachable or connection dropped.
    #[error("mail transport error: {0}")]
    Transport(String),

    /// Relay answered with a temporary (4xx-class) failure.
    #[error("mail relay temporarily refused message: {0}")]
    Deferred(String),

    /// Relay permanently refused the message.
    #[error("mail relay rejected message: {0}")]
    Rejected(String),

    #[error(transparent)]
    BreakerOpen(#[from] BreakerOpen),
}

impl Classify for NotifyError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            NotifyError::Transport(_) => FailureKind::Transport,
            NotifyError::Deferred(_) => FailureKind::Server,
            NotifyError::Rejected(_) => FailureKind::Rejected,
            NotifyError::BreakerOpen(_) => FailureKind::BreakerOpen,
        }
    }
}

/// Something that can deliver an email.
pub trait Mailer: Send + Sync {
    fn send(&self, email: &Email) -> Result<(), NotifyError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone)]
pub struct LogMailer {
    sender: String,
}

impl LogMailer {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }

    /// Use the configured sender address.
    pub fn from_config(config: &MailerConfig) -> Self {
        Self::new(config.sender.clone())
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }
}

impl Mailer for LogMailer {
    fn send(&self, email: &Email) -> Result<(), NotifyError> {
        tracing::info!(
            from = %self.sender,
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "Email (log only)"
        );
        Ok(())
    }
}

/// A mailer guarded by retry (outer) and a circuit breaker (inner).
#[derive(Debug)]
pub struct ResilientMailer<M> {
    inner: M,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
}

impl<M: Mailer> ResilientMailer<M> {
    pub fn new(inner: M, retry: RetryPolicy, breaker: CircuitBreaker) -> Self {
        Self {
            inner,
            retry,
            breaker,
        }
    }

    pub fn from_config(inner: M, config: &MailerConfig) -> Result<Self, ValidationError> {
        let retry = config
            .retries
            .build("mailer")
            .map_err(|source| ValidationError::Retry {
                section: "mailer.retries",
                source,
            })?;
        let breaker = config
            .circuit_breaker
            .build("mailer")
            .map_err(|source| ValidationError::Breaker {
                section: "mailer.circuit_breaker",
                source,
            })?;
        Ok(Self::new(inner, retry, breaker))
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl ResilientMailer<LogMailer> {
    /// Log-only delivery with the configured sender and resilience settings.
    pub fn log_only(config: &MailerConfig) -> Result<Self, ValidationError> {
        Self::from_config(LogMailer::from_config(config), config)
    }
}

impl<M: Mailer> Mailer for ResilientMailer<M> {
    fn send(&self, email: &Email) -> Result<(), NotifyError> {
        let result = self
            .retry
            .run_blocking(|| self.breaker.call(|| self.inner.send(email)));

        match &result {
            Ok(()) => metrics::record_notification("sent"),
            Err(e) => {
                tracing::error!(to = %email.to, error = %e, "Email delivery failed");
                metrics::record_notification("failed");
            }
        }
        result
    }
}
