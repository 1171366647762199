//! Restaurant (point-of-interest) locator.
//!
//! Finds named POIs within a radius of a location by querying an unreliable
//! upstream geodata service, guarded by retry and a circuit breaker, with
//! results cached per canonical search area.

// Domain
pub mod geo;
pub mod search;
pub mod upstream;

// Adapters
pub mod http;
pub mod notify;

// Cross-cutting concerns
pub mod cache;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use search::{Poi, SearchError, SearchService};
