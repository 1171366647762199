//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound call (upstream search, mail delivery):
//!     → retries.rs (outer loop; retry classified-transient failures with backoff)
//!         → circuit_breaker.rs (fail fast while open; record outcome)
//!             → timeouts.rs (bound the single attempt)
//!                 → transport
//! ```
//!
//! # Design Decisions
//! - Retry wraps the breaker, so every attempt is individually gated
//! - Failures are classified into a `FailureKind`; the retry policy decides
//!   on the kind, never on the concrete error type
//! - `BreakerOpen` is never retried: an open breaker ends the retry loop
//! - Breakers and policies are plain values owned by their caller, not globals

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

use serde::{Deserialize, Serialize};

pub use circuit_breaker::{BreakerConfigError, BreakerOpen, BreakerState, CircuitBreaker};
pub use retries::{RetryConfigError, RetryPolicy};
pub use timeouts::{with_timeout, TimedOut};

/// Classification of an outbound-call failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connection or I/O failure before a response arrived.
    Transport,
    /// The attempt exceeded its timeout.
    Timeout,
    /// The remote side reported an overload or internal error (5xx, 429).
    Server,
    /// The remote side refused the request for a reason retrying won't fix.
    Rejected,
    /// A response arrived but could not be decoded.
    Decode,
    /// A circuit breaker rejected the call without attempting it.
    BreakerOpen,
}

impl FailureKind {
    /// Kinds retried when no explicit list is configured.
    pub const TRANSIENT: [FailureKind; 3] =
        [FailureKind::Transport, FailureKind::Timeout, FailureKind::Server];

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Timeout => "timeout",
            FailureKind::Server => "server",
            FailureKind::Rejected => "rejected",
            FailureKind::Decode => "decode",
            FailureKind::BreakerOpen => "breaker_open",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can report which kind of failure they represent.
pub trait Classify {
    fn failure_kind(&self) -> FailureKind;
}

impl Classify for BreakerOpen {
    fn failure_kind(&self) -> FailureKind {
        FailureKind::BreakerOpen
    }
}

impl Classify for TimedOut {
    fn failure_kind(&self) -> FailureKind {
        FailureKind::Timeout
    }
}
