//! Upstream POI sources.
//!
//! # Data Flow
//! ```text
//! PoiQuery (center, radius in meters, amenity)
//!     → PoiSource::fetch (black box that may fail or time out)
//!     → Vec<RawElement> (unfiltered upstream records)
//! ```
//!
//! The search orchestrator treats any `PoiSource` as unreliable and wraps it
//! with retry and circuit breaking; sources themselves never retry.

pub mod overpass;

use std::collections::HashMap;
use std::future::Future;

use serde::Deserialize;
use thiserror::Error;

use crate::geo::Location;
use crate::resilience::{BreakerOpen, Classify, FailureKind, TimedOut};

pub use overpass::OverpassClient;

/// A radius query against an upstream source.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiQuery {
    pub center: Location,
    pub radius_m: u64,
    pub amenity: String,
}

/// One upstream record, as returned (Overpass element shape).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawElement {
    pub id: u64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// Present instead of `lat`/`lon` for ways and relations (`out center`).
    #[serde(default)]
    pub center: Option<Location>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl RawElement {
    /// Non-blank `name` tag, if any.
    pub fn name(&self) -> Option<&str> {
        self.tags
            .get("name")
            .map(String::as_str)
            .filter(|name| !name.trim().is_empty())
    }

    pub fn location(&self) -> Option<Location> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Location { lat, lon }),
            _ => self.center,
        }
    }
}

/// Failures of a single upstream attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpstreamError {
    #[error("upstream transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Timeout(#[from] TimedOut),

    #[error("upstream returned HTTP {status}")]
    Status { status: u16 },

    #[error("failed to decode upstream response: {0}")]
    Decode(String),

    #[error(transparent)]
    BreakerOpen(#[from] BreakerOpen),
}

impl Classify for UpstreamError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            UpstreamError::Transport(_) => FailureKind::Transport,
            UpstreamError::Timeout(_) => FailureKind::Timeout,
            UpstreamError::Status { status } if *status >= 500 || *status == 429 => {
                FailureKind::Server
            }
            UpstreamError::Status { .. } => FailureKind::Rejected,
            UpstreamError::Decode(_) => FailureKind::Decode,
            UpstreamError::BreakerOpen(_) => FailureKind::BreakerOpen,
        }
    }
}

/// A source of points of interest around a location.
pub trait PoiSource: Send + Sync {
    fn fetch(
        &self,
        query: &PoiQuery,
    ) -> impl Future<Output = Result<Vec<RawElement>, UpstreamError>> + Send;
}
