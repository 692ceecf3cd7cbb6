//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router for the storefront endpoints
//! - Wire up middleware (request id, tracing, timeout)
//! - Serve on a bound listener until shutdown is signalled

use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, request};
use crate::config::{ServiceConfig, ShopConfig};
use crate::shop::Shop;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub shop: Arc<Shop>,
    pub service: ServiceConfig,
}

/// HTTP server for the storefront.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &ShopConfig, shop: Arc<Shop>) -> Self {
        let state = AppState {
            shop,
            service: config.service.clone(),
        };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    #[allow(deprecated)]
    fn build_router(config: &ShopConfig, state: AppState) -> Router {
        let service = config.service.name.clone();
        let make_span = move |req: &Request<Body>| request::request_span(req, &service);

        Router::new()
            .route("/healthz", get(handlers::health))
            .route("/api/products", get(handlers::list_products))
            .route("/api/users", get(handlers::list_users))
            .route("/api/orders", post(handlers::create_order))
            .route("/api/checkout", post(handlers::checkout))
            .route("/api/error", get(handlers::simulate_error))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(request::set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(make_span))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                    .layer(request::propagate_request_id_layer()),
            )
    }

    /// Serve until `shutdown` fires, then let in-flight requests finish.
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
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
