//! Shared utilities for integration and load testing.

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use storefront_telemetry::catalog::Catalog;
use storefront_telemetry::config::{ShopConfig, StageLatencies};
use storefront_telemetry::observability::InMemorySink;
use storefront_telemetry::{HttpServer, Shop, Shutdown};
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Config with no simulated latency and a fixed payment outcome.
pub fn instant_config(failure_rate: f64) -> ShopConfig {
    let mut config = ShopConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.observability.metrics_enabled = false;
    config.simulation.latency = StageLatencies::instant();
    config.simulation.payment_failure_rate = failure_rate;
    config.simulation.seed = Some(7);
    config
}

/// Server wired to an in-memory sink.
pub fn build_server(config: &ShopConfig) -> (Arc<InMemorySink>, HttpServer) {
    let sink = Arc::new(InMemorySink::new());
    let shop = Arc::new(Shop::new(
        Arc::new(Catalog::builtin().unwrap()),
        sink.clone(),
        config.simulation.clone(),
    ));
    (sink, HttpServer::new(config, shop))
}

/// Send one request through the router without a socket.
#[allow(dead_code)]
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
) -> (StatusCode, HeaderMap, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

/// Start a real server on an ephemeral port.
#[allow(dead_code)]
pub async fn start_server(config: &ShopConfig) -> (SocketAddr, Arc<InMemorySink>, Shutdown) {
    let (sink, server) = build_server(config);
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, sink, shutdown)
}
