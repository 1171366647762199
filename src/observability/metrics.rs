//! Metrics collection and exposition.
//!
//! # Metrics
//! - `poi_cache_lookups_total` (counter): cache lookups by result (hit, miss)
//! - `poi_cache_entries` (gauge): entries resident in the search cache
//! - `poi_retry_attempts_total` (counter): retries scheduled, by operation
//! - `poi_circuit_breaker_open` (gauge): 1=open, 0=closed, by breaker
//! - `poi_upstream_requests_total` (counter): upstream calls by outcome
//! - `poi_upstream_duration_seconds` (histogram): upstream call latency
//! - `poi_search_requests_total` (counter): searches by status
//! - `poi_notifications_total` (counter): outbound notifications by outcome

use std::net::SocketAddr;
use std::time::Instant;

use ::metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install Prometheus exporter"),
    }
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("poi_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("poi_cache_entries").set(entries as f64);
}

pub fn record_retry(operation: &'static str) {
    counter!("poi_retry_attempts_total", "operation" => operation).increment(1);
}

pub fn record_breaker_state(breaker: &'static str, open: bool) {
    gauge!("poi_circuit_breaker_open", "breaker" => breaker).set(if open { 1.0 } else { 0.0 });
}

pub fn record_upstream_call(outcome: &'static str, start: Instant) {
    counter!("poi_upstream_requests_total", "outcome" => outcome).increment(1);
    histogram!("poi_upstream_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_search(status: &'static str) {
    counter!("poi_search_requests_total", "status" => status).increment(1);
}

pub fn record_notification(outcome: &'static str) {
    counter!("poi_notifications_total", "outcome" => outcome).increment(1);
}
