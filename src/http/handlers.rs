//! Route handlers. Each draws a fresh RNG and delegates to [`Shop`] on a
//! dedicated task.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{Instrument, Span};

use super::server::AppState;
use crate::error::{ShopError, ShopResult};
use crate::shop::{Report, Shop};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: String,
    pub version: String,
    pub environment: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        service: state.service.name.clone(),
        version: state.service.version.clone(),
        environment: state.service.environment.clone(),
    })
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Report, ShopError> {
    let category = query.category;
    run_to_completion(state.shop, move |shop| async move {
        let mut rng = shop.request_rng();
        shop.list_products(category.as_deref(), &mut rng).await
    })
    .await
}

pub async fn list_users(State(state): State<AppState>) -> Result<Report, ShopError> {
    run_to_completion(state.shop, |shop| async move {
        let mut rng = shop.request_rng();
        shop.list_users(&mut rng).await
    })
    .await
}

pub async fn create_order(State(state): State<AppState>) -> Result<Report, ShopError> {
    run_to_completion(state.shop, |shop| async move {
        let mut rng = shop.request_rng();
        shop.create_order(&mut rng).await
    })
    .await
}

pub async fn checkout(State(state): State<AppState>) -> Result<Report, ShopError> {
    run_to_completion(state.shop, |shop| async move {
        let mut rng = shop.request_rng();
        shop.checkout(&mut rng).await
    })
    .await
}

pub async fn simulate_error(State(state): State<AppState>) -> Result<Report, ShopError> {
    run_to_completion(state.shop, |shop| async move { shop.simulate_error().await }).await
}

/// Drive a shop operation on its own task.
///
/// Dropping the handler (client disconnect, response timeout) leaves the
/// task running, so every transaction still reaches a terminal state and
/// reports its outcome.
async fn run_to_completion<F, Fut>(shop: Arc<Shop>, operation: F) -> Result<Report, ShopError>
where
    F: FnOnce(Arc<Shop>) -> Fut,
    Fut: Future<Output = ShopResult<Report>> + Send + 'static,
{
    tokio::spawn(operation(shop).instrument(Span::current())).await?
}
