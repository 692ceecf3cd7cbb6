//! Terminal outcome of each request.
//!
//! Every operation ends by handing its result to [`OutcomeReporter`], which
//! records the request duration exactly once, counts completed orders and
//! shapes the response body. The HTTP layer only maps [`Report`] onto the wire.

use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::info;

use super::Endpoint;
use crate::catalog::{Product, User};
use crate::error::ShopResult;
use crate::observability::metrics::{ORDERS_TOTAL, REQUEST_DURATION};
use crate::observability::TelemetrySink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderResult {
    pub order_id: u32,
    pub user: String,
    pub items: Vec<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub status: TransactionStatus,
}

/// Monetary fields are rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutResult {
    pub user: String,
    pub items: Vec<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub tracking: String,
    pub status: TransactionStatus,
}

/// A checkout whose payment was refused.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclinedCheckout {
    pub user: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    Completed(CheckoutResult),
    Declined(DeclinedCheckout),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    Created,
    PaymentRequired,
    InternalError,
}

impl ResponseStatus {
    pub fn code(self) -> u16 {
        match self {
            ResponseStatus::Ok => 200,
            ResponseStatus::Created => 201,
            ResponseStatus::PaymentRequired => 402,
            ResponseStatus::InternalError => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Order(OrderResult),
    Checkout(CheckoutResult),
    Products(Vec<Product>),
    Users(Vec<User>),
    Error(ErrorBody),
}

/// Response status plus body.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub status: ResponseStatus,
    pub body: ResponseBody,
}

impl Report {
    pub fn ok(body: ResponseBody) -> Self {
        Self {
            status: ResponseStatus::Ok,
            body,
        }
    }

    pub fn created(body: ResponseBody) -> Self {
        Self {
            status: ResponseStatus::Created,
            body,
        }
    }
}

#[derive(Clone)]
pub struct OutcomeReporter {
    sink: Arc<dyn TelemetrySink>,
}

impl OutcomeReporter {
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self { sink }
    }

    pub fn order(
        &self,
        endpoint: Endpoint,
        started: Instant,
        result: ShopResult<OrderResult>,
    ) -> ShopResult<Report> {
        let report = result.map(|order| {
            self.record_completed_order();
            Report::created(ResponseBody::Order(order))
        });
        self.record_duration(endpoint, started);
        report
    }

    pub fn checkout(
        &self,
        endpoint: Endpoint,
        started: Instant,
        result: ShopResult<CheckoutOutcome>,
    ) -> ShopResult<Report> {
        let report = result.map(|outcome| match outcome {
            CheckoutOutcome::Completed(checkout) => {
                self.record_completed_order();
                info!(
                    user = %checkout.user,
                    total = %checkout.total,
                    tracking = %checkout.tracking,
                    "Checkout completed"
                );
                Report::created(ResponseBody::Checkout(checkout))
            }
            CheckoutOutcome::Declined(_) => Report {
                status: ResponseStatus::PaymentRequired,
                body: ResponseBody::Error(ErrorBody::new("Payment declined")),
            },
        });
        self.record_duration(endpoint, started);
        report
    }

    /// Read-only listings and the error endpoint.
    pub fn listing(
        &self,
        endpoint: Endpoint,
        started: Instant,
        result: ShopResult<ResponseBody>,
    ) -> ShopResult<Report> {
        let report = result.map(Report::ok);
        self.record_duration(endpoint, started);
        report
    }

    fn record_completed_order(&self) {
        self.sink
            .add_counter(ORDERS_TOTAL, 1, &[("status", "completed".to_string())]);
    }

    fn record_duration(&self, endpoint: Endpoint, started: Instant) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.sink.record_histogram(
            REQUEST_DURATION,
            elapsed_ms,
            &[("endpoint", endpoint.path().to_string())],
        );
    }
}
