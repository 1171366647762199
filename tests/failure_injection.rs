//! Failure injection tests for the search service.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};

mod common;

const PARIS: (f64, f64) = (48.8566, 2.3522);

fn counting_backend_calls() -> (Arc<AtomicU32>, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    (calls.clone(), calls)
}

#[tokio::test]
async fn test_retry_until_upstream_recovers() {
    let (calls, cc) = counting_backend_calls();
    let upstream = common::start_programmable_backend(move |body| {
        let cc = cc.clone();
        async move {
            assert!(body.starts_with("data="), "unexpected body: {}", body);
            assert!(body.contains("restaurant"));
            if cc.fetch_add(1, Ordering::SeqCst) < 2 {
                (503, r#"{"error": "busy"}"#.into())
            } else {
                (
                    200,
                    common::overpass_body(json!([
                        common::node(1, Some("Le Bistro"), PARIS.0, PARIS.1),
                        common::node(2, None, PARIS.0, PARIS.1 + 0.001),
                        common::node(3, Some("Too Far"), PARIS.0 + 0.05, PARIS.1),
                    ])),
                )
            }
        }
    })
    .await;

    let (service, shutdown) = common::start_service(common::test_config(upstream)).await;
    let client = reqwest::Client::new();

    let res = common::search(&client, service, PARIS.0, PARIS.1, 1.0).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], 1);
    assert_eq!(body["items"][0]["name"], "Le Bistro");
    assert_eq!(body["items"][0]["category"], "restaurant");
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    shutdown.trigger();
}

#[tokio::test]
async fn test_breaker_opens_and_fails_fast() {
    let (calls, cc) = counting_backend_calls();
    let upstream = common::start_programmable_backend(move |_| {
        let cc = cc.clone();
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            (500, r#"{"error": "down"}"#.into())
        }
    })
    .await;

    let mut config = common::test_config(upstream);
    config.retries.max_attempts = 2;
    config.circuit_breaker.failure_threshold = 2;
    config.circuit_breaker.cooldown_secs = 30;
    let (service, shutdown) = common::start_service(config).await;
    let client = reqwest::Client::new();

    // Both attempts fail; the second one trips the breaker.
    let res = common::search(&client, service, PARIS.0, PARIS.1, 1.0).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(res.headers().get("retry-after").is_none());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "search temporarily unavailable");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let res = common::search(&client, service, PARIS.0, PARIS.1, 2.0).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let retry_after: u64 = res.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=30).contains(&retry_after));
    assert_eq!(calls.load(Ordering::SeqCst), 2, "open breaker must not reach upstream");

    let status: Value = client
        .get(format!("http://{}/status", service))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["circuit_breaker"]["state"], "open");
    assert_eq!(status["circuit_breaker"]["failure_threshold"], 2);
    assert_eq!(status["cache"]["entries"], 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_non_retryable_upstream_error() {
    let (calls, cc) = counting_backend_calls();
    let upstream = common::start_programmable_backend(move |_| {
        let cc = cc.clone();
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            (400, r#"{"error": "bad query"}"#.into())
        }
    })
    .await;

    let (service, shutdown) = common::start_service(common::test_config(upstream)).await;
    let client = reqwest::Client::new();

    let res = common::search(&client, service, PARIS.0, PARIS.1, 1.0).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_timeout_is_unavailable() {
    let upstream = common::start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_secs(3)).await;
        (200, common::overpass_body(json!([])))
    })
    .await;

    let mut config = common::test_config(upstream);
    config.upstream.timeout_secs = 1;
    config.retries.max_attempts = 1;
    let (service, shutdown) = common::start_service(config).await;
    let client = reqwest::Client::new();

    let res = common::search(&client, service, PARIS.0, PARIS.1, 1.0).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    shutdown.trigger();
}

#[tokio::test]
async fn test_repeated_search_is_served_from_cache() {
    let (calls, cc) = counting_backend_calls();
    let upstream = common::start_programmable_backend(move |_| {
        let cc = cc.clone();
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            (
                200,
                common::overpass_body(json!([common::node(7, Some("Chez Nous"), PARIS.0, PARIS.1)])),
            )
        }
    })
    .await;

    let (service, shutdown) = common::start_service(common::test_config(upstream)).await;
    let client = reqwest::Client::new();

    let first: Value = common::search(&client, service, PARIS.0, PARIS.1, 1.5)
        .await
        .json()
        .await
        .unwrap();
    // Coordinate jitter below the cache key precision.
    let second: Value = common::search(&client, service, PARIS.0 + 1e-9, PARIS.1, 1.5)
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_invalid_requests_are_rejected_before_upstream() {
    let (calls, cc) = counting_backend_calls();
    let upstream = common::start_programmable_backend(move |_| {
        let cc = cc.clone();
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            (200, common::overpass_body(json!([])))
        }
    })
    .await;

    let (service, shutdown) = common::start_service(common::test_config(upstream)).await;
    let client = reqwest::Client::new();

    for radius in [0.0, -1.0] {
        let res = common::search(&client, service, PARIS.0, PARIS.1, radius).await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = res.json().await.unwrap();
        assert!(body["detail"].as_str().unwrap().contains("radius"));
    }

    let res = common::search(&client, service, 91.0, PARIS.1, 1.0).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = client
        .post(format!("http://{}/restaurants/search", service))
        .json(&json!({ "center": { "lat": 1.0, "lon": 2.0 } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    shutdown.trigger();
}

#[tokio::test]
async fn test_health_endpoint() {
    let upstream =
        common::start_programmable_backend(|_| async { (200, common::overpass_body(json!([]))) })
            .await;
    let (service, shutdown) = common::start_service(common::test_config(upstream)).await;

    let res = reqwest::get(format!("http://{}/health", service)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "status": "ok" }));

    shutdown.trigger();
}
