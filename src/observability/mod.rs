//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms via `metrics`)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for log aggregation)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Metric helpers are free functions so resilience code stays decoupled
//!   from the exporter; without an installed recorder they are no-ops
//! - `RUST_LOG` overrides the configured level

pub mod logging;
pub mod metrics;
