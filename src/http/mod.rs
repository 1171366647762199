//! HTTP adapter over the search service.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, request ID, tracing, timeout)
//!     → handlers.rs (decode + validate body, map errors to status codes)
//!     → SearchService::search_pois
//!     → JSON response
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
