//! Read-only listings and the simulated fault.

use rand::Rng;
use tokio::time::Instant;
use tracing::{error, info};

use super::outcome::{Report, ResponseBody};
use super::{latency, Endpoint, Shop};
use crate::catalog::{Product, User};
use crate::error::{ShopError, ShopResult};
use crate::observability::attributes::DbQueryAttributes;
use crate::observability::metrics::USERS_ACTIVE;
use crate::observability::SpanHandle;

const QUERY_PRODUCTS: &str = "query-products-db";
const QUERY_USERS: &str = "query-users-db";
const FAILING_OPERATION: &str = "failing-operation";

impl Shop {
    /// Products, optionally restricted to one category.
    pub async fn list_products<R: Rng + Send>(
        &self,
        category: Option<&str>,
        rng: &mut R,
    ) -> ShopResult<Report> {
        let started = Instant::now();
        let endpoint = Endpoint::Products;
        self.record_request(endpoint);
        info!(category = category.unwrap_or("all"), "Listing products");

        let result = self
            .tracer
            .with_span(None, endpoint.span_name(), move |root| async move {
                let span = root.child(QUERY_PRODUCTS);
                span.clone()
                    .scope(self.query_products(&span, category, rng))
                    .await
            })
            .await;
        self.reporter
            .listing(endpoint, started, result.map(ResponseBody::Products))
    }

    /// All users. Also nudges the active-users gauge by a random delta.
    pub async fn list_users<R: Rng + Send>(&self, rng: &mut R) -> ShopResult<Report> {
        let started = Instant::now();
        let endpoint = Endpoint::Users;
        self.record_request(endpoint);

        let delta = rng.gen_range(-1..=2);
        self.sink.add_up_down(USERS_ACTIVE, delta, &[]);
        info!(user_count = self.catalog.users().len(), "Listing users");

        let result = self
            .tracer
            .with_span(None, endpoint.span_name(), move |root| async move {
                let span = root.child(QUERY_USERS);
                span.clone().scope(self.query_users(&span, rng)).await
            })
            .await;
        self.reporter
            .listing(endpoint, started, result.map(ResponseBody::Users))
    }

    /// Always fails, to exercise the fault path end to end.
    pub async fn simulate_error(&self) -> ShopResult<Report> {
        let started = Instant::now();
        let endpoint = Endpoint::Error;
        self.record_request(endpoint);
        error!(error_type = "test", "Simulated application error");

        let result = self
            .tracer
            .with_span(None, endpoint.span_name(), move |root| async move {
                self.tracer
                    .with_span(Some(&root), FAILING_OPERATION, |_| async {
                        Err::<ResponseBody, _>(ShopError::simulated(
                            "Something went wrong in the storefront",
                        ))
                    })
                    .await
            })
            .await;
        self.reporter.listing(endpoint, started, result)
    }

    async fn query_products<R: Rng + Send>(
        &self,
        span: &SpanHandle,
        category: Option<&str>,
        rng: &mut R,
    ) -> ShopResult<Vec<Product>> {
        latency::simulate(self.settings.latency.products_query, rng).await;
        let rows: Vec<Product> = self
            .catalog
            .list_products(category)
            .into_iter()
            .cloned()
            .collect();
        let statement = match category {
            Some(c) => format!("SELECT * FROM products WHERE category = '{c}'"),
            None => "SELECT * FROM products".to_string(),
        };
        span.record(&DbQueryAttributes {
            system: "postgresql",
            statement,
            rows_returned: rows.len(),
        });
        Ok(rows)
    }

    async fn query_users<R: Rng + Send>(
        &self,
        span: &SpanHandle,
        rng: &mut R,
    ) -> ShopResult<Vec<User>> {
        latency::simulate(self.settings.latency.users_query, rng).await;
        let rows = self.catalog.users().to_vec();
        span.record(&DbQueryAttributes {
            system: "postgresql",
            statement: "SELECT * FROM users".to_string(),
            rows_returned: rows.len(),
        });
        Ok(rows)
    }
}
