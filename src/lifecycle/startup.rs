//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the upstream client and the search service from validated config
//! - Bind the HTTP listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Config is assumed validated; resilience constructors still re-check

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::validation::ValidationError;
use crate::config::{ListenerConfig, ServiceConfig};
use crate::search::SearchService;
use crate::upstream::overpass::ClientBuildError;
use crate::upstream::OverpassClient;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] ClientBuildError),

    #[error("invalid resilience settings: {0}")]
    Config(#[from] ValidationError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Wire the Overpass-backed search service.
pub fn build_search_service(
    config: &ServiceConfig,
) -> Result<Arc<SearchService<OverpassClient>>, StartupError> {
    let client = OverpassClient::new(&config.upstream)?;
    tracing::info!(
        upstream = %client.url(),
        amenity = %config.upstream.amenity,
        timeout_secs = config.upstream.timeout_secs,
        "Upstream client ready"
    );

    let service = SearchService::from_config(client, config)?;
    Ok(Arc::new(service))
}

pub async fn bind_listener(config: &ListenerConfig) -> Result<TcpListener, StartupError> {
    TcpListener::bind(&config.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.bind_address.clone(),
            source,
        })
}
