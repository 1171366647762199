//! Overpass API client.
//!
//! # Responsibilities
//! - Render an Overpass QL radius query for one amenity
//! - POST it as a form body and decode the JSON elements
//! - Bound every attempt with a timeout and classify failures
//!
//! The upstream `around` filter is approximate; callers must re-check
//! distances themselves.

use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::resilience::with_timeout;
use crate::upstream::{PoiQuery, PoiSource, RawElement, UpstreamError};

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<RawElement>,
}

/// Failure to construct the client.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid upstream URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Overpass interpreter client.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    http: reqwest::Client,
    url: Url,
    timeout: Duration,
}

impl OverpassClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ClientBuildError> {
        let url = Url::parse(&config.url)?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            url,
            timeout: config.timeout(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Overpass QL for nodes tagged `amenity=<query.amenity>` within the radius.
    pub fn build_query(&self, query: &PoiQuery) -> String {
        format!(
            "[out:json][timeout:{timeout}];\nnode[\"amenity\"=\"{amenity}\"](around:{radius},{lat},{lon});\nout center;",
            timeout = self.timeout.as_secs().max(1),
            amenity = escape_ql(&query.amenity),
            radius = query.radius_m,
            lat = query.center.lat,
            lon = query.center.lon,
        )
    }

    async fn send(&self, query: &PoiQuery) -> Result<Vec<RawElement>, UpstreamError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("data", &self.build_query(query))
            .finish();

        let response = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        let parsed: OverpassResponse =
            serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        Ok(parsed.elements)
    }
}

impl PoiSource for OverpassClient {
    async fn fetch(&self, query: &PoiQuery) -> Result<Vec<RawElement>, UpstreamError> {
        let start = Instant::now();
        let result = with_timeout(self.timeout, self.send(query)).await;

        match &result {
            Ok(elements) => {
                tracing::debug!(elements = elements.len(), "Overpass query succeeded");
                metrics::record_upstream_call("success", start);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Overpass query failed");
                metrics::record_upstream_call("failure", start);
            }
        }
        result
    }
}

fn escape_ql(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
