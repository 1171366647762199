//! Circuit breaker for outbound dependencies.
//!
//! # States
//! - Closed: calls pass through, consecutive failures accumulate
//! - Open: calls fail fast with `BreakerOpen`, the operation is not attempted
//!
//! # State Transitions
//! ```text
//! Closed → Open:   failure_count reaches failure_threshold
//! Open → Closed:   first is_open() check after the cooldown has elapsed
//! any → Closed:    record_success()
//! ```
//!
//! There is no half-open probe quota: once the cooldown elapses the next call
//! goes through as a normal attempt with a fresh failure count.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use crate::observability::metrics;

/// Externally visible breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
}

/// A call was rejected because the breaker is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("circuit breaker '{name}' is open, retry after {retry_after:?}")]
pub struct BreakerOpen {
    pub name: &'static str,
    /// Time left until the cooldown elapses.
    pub retry_after: Duration,
}

/// Rejected breaker parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BreakerConfigError {
    #[error("failure_threshold must be at least 1")]
    ZeroThreshold,
}

#[derive(Debug, Default)]
struct Counters {
    failure_count: u32,
    opened_at: Option<Instant>,
}

/// Consecutive-failure circuit breaker, shared by every caller of one
/// protected operation. All transitions happen under a single mutex.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: &'static str,
    failure_threshold: u32,
    cooldown: Duration,
    counters: Mutex<Counters>,
}

impl CircuitBreaker {
    pub fn new(
        name: &'static str,
        failure_threshold: u32,
        cooldown: Duration,
    ) -> Result<Self, BreakerConfigError> {
        if failure_threshold == 0 {
            return Err(BreakerConfigError::ZeroThreshold);
        }
        metrics::record_breaker_state(name, false);
        Ok(Self {
            name,
            failure_threshold,
            cooldown,
            counters: Mutex::new(Counters::default()),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    // A panic while holding the lock cannot leave the counters half-updated,
    // so a poisoned mutex is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether calls are currently rejected.
    ///
    /// Side effect: if the breaker is open and the cooldown has elapsed, it is
    /// reset to closed (failure count 0) and `false` is returned.
    pub fn is_open(&self) -> bool {
        self.check().is_err()
    }

    /// Admit or reject a call, resetting the breaker if its cooldown is over.
    fn check(&self) -> Result<(), BreakerOpen> {
        let mut counters = self.lock();
        let Some(opened_at) = counters.opened_at else {
            return Ok(());
        };

        let elapsed = opened_at.elapsed();
        if elapsed >= self.cooldown {
            counters.failure_count = 0;
            counters.opened_at = None;
            drop(counters);
            tracing::info!(breaker = self.name, "Cooldown elapsed, circuit breaker closed");
            metrics::record_breaker_state(self.name, false);
            return Ok(());
        }

        Err(BreakerOpen {
            name: self.name,
            retry_after: self.cooldown - elapsed,
        })
    }

    /// Clear the failure count and any open state.
    pub fn record_success(&self) {
        let mut counters = self.lock();
        let was_open = counters.opened_at.is_some();
        counters.failure_count = 0;
        counters.opened_at = None;
        drop(counters);

        if was_open {
            tracing::info!(breaker = self.name, "Circuit breaker closed after success");
            metrics::record_breaker_state(self.name, false);
        }
    }

    /// Count a failure, opening the breaker when the threshold is reached.
    ///
    /// Failures that land while already open do not extend the cooldown.
    pub fn record_failure(&self) {
        let mut counters = self.lock();
        counters.failure_count = counters.failure_count.saturating_add(1);
        let failure_count = counters.failure_count;

        if counters.opened_at.is_none() && failure_count >= self.failure_threshold {
            counters.opened_at = Some(Instant::now());
            drop(counters);
            tracing::warn!(
                breaker = self.name,
                failure_count,
                cooldown_secs = self.cooldown.as_secs_f64(),
                "Circuit breaker opened"
            );
            metrics::record_breaker_state(self.name, true);
        }
    }

    /// Snapshot of the state without triggering the cooldown reset.
    pub fn state(&self) -> BreakerState {
        match self.lock().opened_at {
            Some(opened_at) if opened_at.elapsed() < self.cooldown => BreakerState::Open,
            _ => BreakerState::Closed,
        }
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    /// Run `op` through the breaker.
    ///
    /// Fails fast with `BreakerOpen` (converted into `E`) while open; otherwise
    /// records the outcome and returns it unchanged.
    pub fn call<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<BreakerOpen>,
    {
        self.check()?;
        let result = op();
        self.record(&result);
        result
    }

    /// Async counterpart of [`call`](Self::call).
    pub async fn call_async<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<BreakerOpen>,
    {
        self.check()?;
        let result = op().await;
        self.record(&result);
        result
    }

    fn record<T, E>(&self, result: &Result<T, E>) {
        match result {
            Ok(_) => self.record_success(),
            Err(_) => self.record_failure(),
        }
    }
}
