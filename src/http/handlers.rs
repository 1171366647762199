//! Route handlers.
//!
//! Status mapping for `/restaurants/search`:
//! - malformed or invalid body → the rejection's status (422 for bad values)
//! - breaker open → 503 with `Retry-After`
//! - any other upstream failure → 503

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::geo::SearchArea;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resilience::BreakerState;
use crate::search::Poi;
use crate::upstream::PoiSource;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse<'a> {
    pub total: usize,
    pub items: &'a [Poi],
}

#[derive(Debug, Serialize)]
pub struct BreakerStatus {
    pub state: BreakerState,
    pub failure_count: u32,
    pub failure_threshold: u32,
    pub cooldown_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct CacheStatus {
    pub entries: usize,
    pub ttl_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub version: &'static str,
    pub circuit_breaker: BreakerStatus,
    pub cache: CacheStatus,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus { status: "ok" })
}

pub async fn status<S: PoiSource + 'static>(State(state): State<AppState<S>>) -> Json<ServiceStatus> {
    let breaker = state.search.breaker();
    let cache = state.search.cache();

    Json(ServiceStatus {
        version: env!("CARGO_PKG_VERSION"),
        circuit_breaker: BreakerStatus {
            state: breaker.state(),
            failure_count: breaker.failure_count(),
            failure_threshold: breaker.failure_threshold(),
            cooldown_secs: breaker.cooldown().as_secs(),
        },
        cache: CacheStatus {
            entries: cache.len(),
            ttl_secs: cache.ttl().as_secs(),
        },
    })
}

pub async fn search<S: PoiSource + 'static>(
    State(state): State<AppState<S>>,
    payload: Result<Json<SearchArea>, JsonRejection>,
) -> Response {
    let area = match payload {
        Ok(Json(area)) => area,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Rejected search request");
            metrics::record_search("invalid");
            return error_response(rejection.status(), rejection.body_text());
        }
    };

    match state.search.search_pois(&area).await {
        Ok(pois) => {
            metrics::record_search("ok");
            Json(SearchResponse {
                total: pois.len(),
                items: &pois,
            })
            .into_response()
        }
        Err(err) => {
            metrics::record_search("unavailable");
            let mut response = error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "search temporarily unavailable".to_string(),
            );
            if let Some(wait) = err.retry_after() {
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs(wait)));
            }
            response
        }
    }
}

fn error_response(status: StatusCode, detail: String) -> Response {
    (status, Json(ErrorBody { detail })).into_response()
}

/// Whole seconds, rounded up, never below one.
fn retry_after_secs(wait: std::time::Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}
