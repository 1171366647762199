//! POI locator service.
//!
//! ```text
//!  Client ──POST /restaurants/search──▶ http ──▶ search ──▶ cache
//!                                                  │
//!                                                  ▼  (miss)
//!                                  retry ──▶ circuit breaker ──▶ Overpass
//! ```

use std::path::PathBuf;

use clap::Parser;

use poi_locator::config::{load_config, ServiceConfig};
use poi_locator::http::HttpServer;
use poi_locator::lifecycle::{bind_listener, build_search_service, wait_for_signal, Shutdown};
use poi_locator::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "poi-locator")]
#[command(about = "Restaurant locator service", long_about = None)]
struct Args {
    /// Path to a TOML config file; built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "poi-locator starting");
    tracing::info!(
        config_file = ?args.config,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.listener.request_timeout_secs,
        cache_ttl_secs = config.cache.ttl_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let search = build_search_service(&config)?;
    let server = HttpServer::new(search, &config.listener);
    let listener = bind_listener(&config.listener).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
