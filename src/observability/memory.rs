//! In-process telemetry aggregation.
//!
//! Keeps every measurement and finished span in memory so callers can
//! inspect exactly what a request emitted. Aggregates live in `DashMap`
//! entries, so concurrent requests never lose an update.

use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;

use super::tracing::FinishedSpan;
use super::{Label, TelemetrySink};

/// Metric identity: name plus label set, labels sorted by key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricKey {
    pub name: &'static str,
    pub labels: Vec<Label>,
}

impl MetricKey {
    pub fn new(name: &'static str, labels: &[Label]) -> Self {
        let mut labels = labels.to_vec();
        labels.sort();
        Self { name, labels }
    }
}

/// Capturing sink.
#[derive(Debug, Default)]
pub struct InMemorySink {
    counters: DashMap<MetricKey, u64>,
    up_downs: DashMap<MetricKey, i64>,
    histograms: DashMap<MetricKey, Vec<f64>>,
    spans: Mutex<Vec<FinishedSpan>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter value for an exact label set.
    pub fn counter(&self, name: &'static str, labels: &[Label]) -> u64 {
        self.counters
            .get(&MetricKey::new(name, labels))
            .map_or(0, |v| *v)
    }

    /// Counter value summed over every label set.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.counters
            .iter()
            .filter(|entry| entry.key().name == name)
            .map(|entry| *entry.value())
            .sum()
    }

    pub fn up_down(&self, name: &'static str, labels: &[Label]) -> i64 {
        self.up_downs
            .get(&MetricKey::new(name, labels))
            .map_or(0, |v| *v)
    }

    /// Histogram samples for an exact label set, in recording order.
    pub fn histogram(&self, name: &'static str, labels: &[Label]) -> Vec<f64> {
        self.histograms
            .get(&MetricKey::new(name, labels))
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Number of histogram samples across every label set.
    pub fn histogram_count(&self, name: &str) -> usize {
        self.histograms
            .iter()
            .filter(|entry| entry.key().name == name)
            .map(|entry| entry.value().len())
            .sum()
    }

    /// Finished spans in the order they ended.
    pub fn spans(&self) -> Vec<FinishedSpan> {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn span_named(&self, name: &str) -> Option<FinishedSpan> {
        self.spans().into_iter().find(|s| s.name == name)
    }
}

impl TelemetrySink for InMemorySink {
    fn add_counter(&self, name: &'static str, delta: u64, labels: &[Label]) {
        *self.counters.entry(MetricKey::new(name, labels)).or_insert(0) += delta;
    }

    fn record_histogram(&self, name: &'static str, value: f64, labels: &[Label]) {
        self.histograms
            .entry(MetricKey::new(name, labels))
            .or_default()
            .push(value);
    }

    fn add_up_down(&self, name: &'static str, delta: i64, labels: &[Label]) {
        *self.up_downs.entry(MetricKey::new(name, labels)).or_insert(0) += delta;
    }

    fn export_span(&self, span: FinishedSpan) {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_labels_are_order_insensitive() {
        let sink = InMemorySink::new();
        sink.add_counter(
            "app.request.count",
            1,
            &[("method", "GET".into()), ("endpoint", "/api/users".into())],
        );
        sink.add_counter(
            "app.request.count",
            2,
            &[("endpoint", "/api/users".into()), ("method", "GET".into())],
        );

        assert_eq!(
            sink.counter(
                "app.request.count",
                &[("endpoint", "/api/users".into()), ("method", "GET".into())]
            ),
            3
        );
    }

    #[test]
    fn test_distinct_label_sets_aggregate_separately() {
        let sink = InMemorySink::new();
        sink.add_counter("app.orders.total", 1, &[("status", "completed".into())]);
        sink.add_counter("app.orders.total", 1, &[("status", "other".into())]);

        assert_eq!(sink.counter("app.orders.total", &[("status", "completed".into())]), 1);
        assert_eq!(sink.counter_total("app.orders.total"), 2);
    }

    #[test]
    fn test_up_down_goes_negative() {
        let sink = InMemorySink::new();
        sink.add_up_down("app.users.active", -1, &[]);
        sink.add_up_down("app.users.active", -1, &[]);
        sink.add_up_down("app.users.active", 1, &[]);
        assert_eq!(sink.up_down("app.users.active", &[]), -1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_are_not_lost() {
        let sink = Arc::new(InMemorySink::new());
        let mut tasks = Vec::new();

        for _ in 0..8 {
            let sink = sink.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..1000 {
                    sink.add_counter("app.request.count", 1, &[]);
                    sink.add_up_down("app.users.active", if i % 2 == 0 { 2 } else { -1 }, &[]);
                    sink.record_histogram("app.request.duration", 1.0, &[]);
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(sink.counter("app.request.count", &[]), 8000);
        assert_eq!(sink.up_down("app.users.active", &[]), 4000);
        assert_eq!(sink.histogram_count("app.request.duration"), 8000);
    }
}
