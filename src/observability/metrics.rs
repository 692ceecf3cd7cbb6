//! Metrics collection and exposition.
//!
//! # Metrics
//! - `app.request.count` (counter): requests by endpoint, method
//! - `app.request.duration` (histogram, ms): total request latency by endpoint
//! - `app.orders.total` (counter): completed orders by status
//! - `app.users.active` (up-down counter): simulated active users
//!
//! # Design Decisions
//! - [`MetricsSink`] writes through the `metrics` facade; the installed
//!   recorder owns aggregation (atomic handles per name and label set)
//! - Prometheus exposition via `metrics-exporter-prometheus`
//! - Histogram buckets tuned for the simulated stage latencies

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use thiserror::Error;

use super::tracing::{FinishedSpan, SpanStatus};
use super::{Label, TelemetrySink};

pub const REQUEST_COUNT: &str = "app.request.count";
pub const REQUEST_DURATION: &str = "app.request.duration";
pub const ORDERS_TOTAL: &str = "app.orders.total";
pub const USERS_ACTIVE: &str = "app.users.active";

const DURATION_BUCKETS_MS: &[f64] = &[
    5.0, 10.0, 25.0, 50.0, 75.0, 100.0, 150.0, 200.0, 300.0, 500.0, 750.0, 1000.0,
];

/// Errors from exporter setup.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Register metric descriptions. Called once at startup.
pub fn register_metrics() {
    describe_counter!(REQUEST_COUNT, Unit::Count, "Total number of requests");
    describe_histogram!(
        REQUEST_DURATION,
        Unit::Milliseconds,
        "Request duration in milliseconds"
    );
    describe_counter!(ORDERS_TOTAL, Unit::Count, "Total orders created");
    describe_gauge!(USERS_ACTIVE, Unit::Count, "Currently active users");
}

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
pub fn install_exporter(addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), DURATION_BUCKETS_MS)
        .map_err(|e| MetricsError::Build(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    register_metrics();
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn to_labels(labels: &[Label]) -> Vec<metrics::Label> {
    labels
        .iter()
        .map(|(key, value)| metrics::Label::new(*key, value.clone()))
        .collect()
}

/// Sink backed by whatever `metrics` recorder is installed.
///
/// Finished spans are emitted as debug-level `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSink;

impl TelemetrySink for MetricsSink {
    fn add_counter(&self, name: &'static str, delta: u64, labels: &[Label]) {
        counter!(name, to_labels(labels)).increment(delta);
    }

    fn record_histogram(&self, name: &'static str, value: f64, labels: &[Label]) {
        histogram!(name, to_labels(labels)).record(value);
    }

    fn add_up_down(&self, name: &'static str, delta: i64, labels: &[Label]) {
        let gauge = gauge!(name, to_labels(labels));
        if delta >= 0 {
            gauge.increment(delta as f64);
        } else {
            gauge.decrement(delta.unsigned_abs() as f64);
        }
    }

    fn export_span(&self, span: FinishedSpan) {
        let attributes = span
            .attributes
            .iter()
            .map(|kv| format!("{}={}", kv.key, kv.value))
            .collect::<Vec<_>>()
            .join(" ");
        let status = match &span.status {
            SpanStatus::Unset => "unset",
            SpanStatus::Ok => "ok",
            SpanStatus::Error { .. } => "error",
        };
        tracing::debug!(
            trace_id = %span.trace_id,
            span_id = span.span_id,
            parent_id = ?span.parent_id,
            span_name = span.name,
            status,
            cause = span.cause.as_deref().unwrap_or(""),
            duration_ms = span.duration.as_secs_f64() * 1000.0,
            attributes = %attributes,
            "Span finished"
        );
    }
}
