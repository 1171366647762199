//! Area search orchestration.
//!
//! # Data Flow
//! ```text
//! SearchArea
//!     → canonical AreaKey → TtlCache hit? → return cached list
//!     → miss: RetryPolicy::run(|| CircuitBreaker::call_async(|| PoiSource::fetch))
//!     → drop unnamed records, re-check haversine distance against the radius
//!     → TtlCache::set → return
//! ```
//!
//! # Design Decisions
//! - Retry is the outer layer, so each attempt passes the breaker check
//! - An open breaker is not retryable; it ends the loop immediately
//! - Every upstream failure surfaces as one "temporarily unavailable" error;
//!   no partial results are returned

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::cache::TtlCache;
use crate::config::validation::ValidationError;
use crate::config::ServiceConfig;
use crate::geo::{AreaKey, Location, SearchArea};
use crate::observability::metrics;
use crate::resilience::{BreakerOpen, CircuitBreaker, RetryPolicy};
use crate::upstream::{PoiQuery, PoiSource, RawElement, UpstreamError};

/// A point of interest returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Poi {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub location: Location,
}

/// Caller-facing search failures.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The upstream breaker is open; no attempt was made.
    #[error("search temporarily unavailable: {0}")]
    CircuitOpen(BreakerOpen),

    /// The upstream call failed (retries exhausted or a non-retryable failure).
    #[error("search temporarily unavailable: {0}")]
    Unavailable(#[source] UpstreamError),
}

impl SearchError {
    /// How long callers should wait before trying again, when known.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SearchError::CircuitOpen(open) => Some(open.retry_after),
            SearchError::Unavailable(_) => None,
        }
    }
}

impl From<UpstreamError> for SearchError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::BreakerOpen(open) => SearchError::CircuitOpen(open),
            other => SearchError::Unavailable(other),
        }
    }
}

pub type SearchResult<T> = Result<T, SearchError>;

/// Cached, resilient POI search over one upstream source.
///
/// Owns its breaker and cache; share the service (e.g. behind `Arc`) to share them.
pub struct SearchService<S> {
    source: S,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
    cache: TtlCache<AreaKey, Arc<[Poi]>>,
    category: String,
}

impl<S: PoiSource> SearchService<S> {
    pub fn new(
        source: S,
        retry: RetryPolicy,
        breaker: CircuitBreaker,
        cache: TtlCache<AreaKey, Arc<[Poi]>>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            source,
            retry,
            breaker,
            cache,
            category: category.into(),
        }
    }

    /// Wire the service from validated configuration.
    pub fn from_config(source: S, config: &ServiceConfig) -> Result<Self, ValidationError> {
        let retry = config
            .retries
            .build("overpass")
            .map_err(|source| ValidationError::Retry {
                section: "retries",
                source,
            })?;
        let breaker = config
            .circuit_breaker
            .build("overpass")
            .map_err(|source| ValidationError::Breaker {
                section: "circuit_breaker",
                source,
            })?;

        Ok(Self::new(
            source,
            retry,
            breaker,
            TtlCache::new(config.cache.ttl()),
            config.upstream.amenity.clone(),
        ))
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn cache(&self) -> &TtlCache<AreaKey, Arc<[Poi]>> {
        &self.cache
    }

    /// Find POIs within `area`, serving from cache when possible.
    pub async fn search_pois(&self, area: &SearchArea) -> SearchResult<Arc<[Poi]>> {
        let key = area.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(results = hit.len(), "Search cache hit");
            metrics::record_cache_lookup(true);
            return Ok(hit);
        }
        metrics::record_cache_lookup(false);

        let query = PoiQuery {
            center: area.center(),
            radius_m: area.radius_m(),
            amenity: self.category.clone(),
        };

        let elements = self
            .retry
            .run(|| self.breaker.call_async(|| self.source.fetch(&query)))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Search upstream unavailable");
                SearchError::from(e)
            })?;

        let received = elements.len();
        let pois: Arc<[Poi]> = filter_elements(area, &self.category, elements).into();
        tracing::debug!(received, kept = pois.len(), "Filtered upstream results");

        self.cache.set(key, pois.clone());
        metrics::record_cache_size(self.cache.len());
        Ok(pois)
    }
}

/// Keep named records whose great-circle distance is within the radius.
fn filter_elements(area: &SearchArea, category: &str, elements: Vec<RawElement>) -> Vec<Poi> {
    elements
        .into_iter()
        .filter_map(|element| {
            let location = element.location()?;
            let name = element.name()?.to_string();
            area.contains(location).then(|| Poi {
                id: element.id,
                name,
                category: category.to_string(),
                location,
            })
        })
        .collect()
}
