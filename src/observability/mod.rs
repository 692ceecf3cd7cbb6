//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! shop pipeline stages produce:
//!     → tracing.rs (spans with typed attributes, explicit parent handles)
//!     → TelemetrySink (counters, histograms, up-down counters, finished spans)
//!     → `tracing` events (structured logs, correlated through stage spans)
//!
//! Sinks:
//!     → metrics.rs (metrics facade, Prometheus scrape endpoint)
//!     → memory.rs (in-process aggregates, used by tests)
//! ```
//!
//! # Design Decisions
//! - One sink instance is injected into the shop; no module-level singleton
//! - Recording never fails and is safe under concurrent requests
//! - Span attributes are per-stage structs flattened at the sink boundary

pub mod attributes;
pub mod logging;
pub mod memory;
pub mod metrics;
pub mod tracing;

pub use attributes::{AttributeValue, KeyValue, SpanAttributes};
pub use memory::InMemorySink;
pub use self::metrics::MetricsSink;
pub use self::tracing::{FinishedSpan, SpanHandle, SpanStatus, Tracer};

/// A metric label: name and value.
pub type Label = (&'static str, String);

/// Destination for every measurement and finished span.
///
/// Implementations aggregate process-wide, keyed by metric name and label
/// set. Every method may be called concurrently from independent requests.
pub trait TelemetrySink: Send + Sync {
    /// Add a monotonic delta to a counter.
    fn add_counter(&self, name: &'static str, delta: u64, labels: &[Label]);

    /// Record one histogram sample.
    fn record_histogram(&self, name: &'static str, value: f64, labels: &[Label]);

    /// Add a signed delta to an up-down counter.
    fn add_up_down(&self, name: &'static str, delta: i64, labels: &[Label]);

    /// Receive a span once it has ended.
    fn export_span(&self, span: FinishedSpan);
}
