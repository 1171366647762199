//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Serve on a bound listener until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::HeaderName,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ListenerConfig;
use crate::http::handlers;
use crate::http::request::{MakeRequestUuidV4, X_REQUEST_ID};
use crate::search::SearchService;
use crate::upstream::PoiSource;

/// Application state injected into handlers.
pub struct AppState<S> {
    pub search: Arc<SearchService<S>>,
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            search: self.search.clone(),
        }
    }
}

/// HTTP server for the search service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new<S: PoiSource + 'static>(
        search: Arc<SearchService<S>>,
        config: &ListenerConfig,
    ) -> Self {
        let state = AppState { search };
        let router = Self::build_router(
            state,
            Duration::from_secs(config.request_timeout_secs),
        );
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router<S: PoiSource + 'static>(state: AppState<S>, request_timeout: Duration) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/health", get(handlers::health))
            .route("/status", get(handlers::status::<S>))
            .route("/restaurants/search", post(handlers::search::<S>))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(request_id))
                    .layer(TimeoutLayer::new(request_timeout)),
            )
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
