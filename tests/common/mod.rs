//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use poi_locator::config::ServiceConfig;
use poi_locator::http::HttpServer;
use poi_locator::lifecycle::{build_search_service, Shutdown};

/// Start a programmable mock Overpass backend on an ephemeral port.
///
/// `f` receives the raw request body and returns `(status, json body)`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let body = read_request_body(&mut socket).await;
                        let (status, body) = f(body).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            504 => "504 Gateway Timeout",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Read one HTTP/1.1 request and return its body.
async fn read_request_body(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return String::new(),
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            let start = end + 4;
            if buf.len() >= start + length {
                return String::from_utf8_lossy(&buf[start..start + length]).into_owned();
            }
        }
    }
}

/// Overpass-shaped response body.
pub fn overpass_body(elements: Value) -> String {
    json!({ "version": 0.6, "elements": elements }).to_string()
}

/// A node element as Overpass returns it.
pub fn node(id: u64, name: Option<&str>, lat: f64, lon: f64) -> Value {
    let mut tags = json!({ "amenity": "restaurant" });
    if let Some(name) = name {
        tags["name"] = json!(name);
    }
    json!({ "type": "node", "id": id, "lat": lat, "lon": lon, "tags": tags })
}

/// Config pointing at `upstream` with fast retries.
pub fn test_config(upstream: SocketAddr) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.url = format!("http://{}/api/interpreter", upstream);
    config.upstream.timeout_secs = 2;
    config.retries.initial_delay_ms = 10;
    config
}

/// Start the full HTTP service; returns its address and the shutdown handle.
pub async fn start_service(config: ServiceConfig) -> (SocketAddr, Shutdown) {
    let search = build_search_service(&config).unwrap();
    let server = HttpServer::new(search, &config.listener);
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// POST a search and return the raw response.
pub async fn search(
    client: &reqwest::Client,
    service: SocketAddr,
    lat: f64,
    lon: f64,
    radius_km: f64,
) -> reqwest::Response {
    client
        .post(format!("http://{}/restaurants/search", service))
        .json(&json!({ "center": { "lat": lat, "lon": lon }, "radius_km": radius_km }))
        .send()
        .await
        .unwrap()
}
