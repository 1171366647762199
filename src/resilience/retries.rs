//! Retry logic.
//!
//! # Responsibilities
//! - Validate retry parameters at construction
//! - Re-run a failed operation with exponential backoff
//! - Give up at once on failure kinds outside the retryable set
//!
//! Async (`run`) and blocking (`run_blocking`) execution share one decision
//! procedure; only the wait differs.

use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::observability::metrics;
use crate::resilience::backoff::ExponentialBackoff;
use crate::resilience::{Classify, FailureKind};

/// Rejected retry parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RetryConfigError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("initial delay must be greater than zero")]
    ZeroDelay,

    #[error("backoff factor must be greater than 1 (got {0})")]
    Factor(f64),

    #[error("breaker_open failures cannot be retried")]
    BreakerOpenRetryable,
}

/// Bounded exponential-backoff retry policy. Immutable once built.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    backoff_factor: f64,
    retry_on: HashSet<FailureKind>,
    operation: &'static str,
}

impl RetryPolicy {
    /// Build a policy. Invalid ranges are an error, never clamped.
    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        backoff_factor: f64,
        retry_on: impl IntoIterator<Item = FailureKind>,
    ) -> Result<Self, RetryConfigError> {
        if max_attempts < 1 {
            return Err(RetryConfigError::ZeroAttempts);
        }
        if initial_delay.is_zero() {
            return Err(RetryConfigError::ZeroDelay);
        }
        if !backoff_factor.is_finite() || backoff_factor <= 1.0 {
            return Err(RetryConfigError::Factor(backoff_factor));
        }
        let retry_on: HashSet<FailureKind> = retry_on.into_iter().collect();
        if retry_on.contains(&FailureKind::BreakerOpen) {
            return Err(RetryConfigError::BreakerOpenRetryable);
        }

        Ok(Self {
            max_attempts,
            initial_delay,
            backoff_factor,
            retry_on,
            operation: "operation",
        })
    }

    /// Label used in logs and metrics.
    pub fn for_operation(mut self, operation: &'static str) -> Self {
        self.operation = operation;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    pub fn is_retryable(&self, kind: FailureKind) -> bool {
        self.retry_on.contains(&kind)
    }

    /// Run `op` until it succeeds, fails with a non-retryable kind, or
    /// attempts run out. Waits suspend only the calling task.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + Display,
    {
        let mut delays = self.delays();
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => match self.next_delay(attempt, &err, &mut delays) {
                    Some(delay) => tokio::time::sleep(delay).await,
                    None => return Err(err),
                },
            }
            attempt += 1;
        }
    }

    /// Blocking counterpart of [`run`](Self::run); sleeps the current thread.
    pub fn run_blocking<T, E, F>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify + Display,
    {
        let mut delays = self.delays();
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => match self.next_delay(attempt, &err, &mut delays) {
                    Some(delay) => std::thread::sleep(delay),
                    None => return Err(err),
                },
            }
            attempt += 1;
        }
    }

    fn delays(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self.initial_delay, self.backoff_factor)
    }

    /// Decide what follows failed attempt number `attempt` (1-based):
    /// `Some(delay)` to wait and retry, `None` to hand the failure back.
    fn next_delay<E>(
        &self,
        attempt: u32,
        err: &E,
        delays: &mut ExponentialBackoff,
    ) -> Option<Duration>
    where
        E: Classify + Display,
    {
        let kind = err.failure_kind();
        if !self.is_retryable(kind) {
            tracing::debug!(
                operation = self.operation,
                attempt,
                kind = %kind,
                error = %err,
                "Failure is not retryable"
            );
            return None;
        }

        if attempt >= self.max_attempts {
            tracing::warn!(
                operation = self.operation,
                attempt,
                kind = %kind,
                error = %err,
                "Attempt failed, no attempts left"
            );
            return None;
        }

        let delay = delays.next()?;
        tracing::warn!(
            operation = self.operation,
            attempt,
            kind = %kind,
            error = %err,
            delay_ms = delay.as_millis() as u64,
            "Attempt failed, retrying"
        );
        metrics::record_retry(self.operation);
        Some(delay)
    }
}
