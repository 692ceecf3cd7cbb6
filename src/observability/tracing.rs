//! Spans for units of work.
//!
//! # Responsibilities
//! - Create spans with an explicit parent handle (no ambient current span)
//! - Carry typed attributes, a status and an optional failure cause
//! - Guarantee each span is ended exactly once on every exit path
//! - Mirror every span into a `tracing` span so log lines correlate
//!
//! # Design Decisions
//! - [`SpanHandle`] is a cheap clone; a stage receives the handle directly
//! - [`SpanHandle::scope`] ends the span when the work resolves, fails or is
//!   dropped mid-flight
//! - Writes after the span has ended are ignored and logged

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use super::attributes::{AttributeValue, KeyValue, SpanAttributes};
use super::TelemetrySink;

/// Terminal status of a span.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpanStatus {
    #[default]
    Unset,
    Ok,
    Error { message: String },
}

/// Snapshot of a span handed to the sink when it ends.
#[derive(Debug, Clone)]
pub struct FinishedSpan {
    pub trace_id: Uuid,
    pub span_id: u64,
    pub parent_id: Option<u64>,
    pub name: &'static str,
    pub attributes: Vec<KeyValue>,
    pub status: SpanStatus,
    pub cause: Option<String>,
    pub duration: Duration,
}

impl FinishedSpan {
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|kv| kv.key == key)
            .map(|kv| &kv.value)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, SpanStatus::Error { .. })
    }
}

/// Creates spans and forwards finished ones to the sink.
#[derive(Clone)]
pub struct Tracer {
    sink: Arc<dyn TelemetrySink>,
    next_id: Arc<AtomicU64>,
}

impl Tracer {
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            sink,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Start a span. A span without a parent begins a new trace.
    ///
    /// The caller owns ending it; prefer [`Tracer::with_span`].
    pub fn start(&self, parent: Option<&SpanHandle>, name: &'static str) -> SpanHandle {
        let span_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (trace_id, parent_id, mirror) = match parent {
            Some(p) => (
                p.inner.trace_id,
                Some(p.inner.span_id),
                tracing::info_span!(parent: &p.inner.mirror, "span", otel.name = name, span_id),
            ),
            None => {
                let trace_id = Uuid::new_v4();
                (
                    trace_id,
                    None,
                    tracing::info_span!("span", otel.name = name, span_id, trace_id = %trace_id),
                )
            }
        };

        SpanHandle {
            inner: Arc::new(SpanInner {
                trace_id,
                span_id,
                parent_id,
                name,
                started: Instant::now(),
                tracer: self.clone(),
                mirror,
                state: Mutex::new(SpanState::default()),
            }),
        }
    }

    /// Run `work` inside a new span and end the span afterwards.
    ///
    /// A failure returned by `work` is recorded on the span before it ends
    /// and then handed back to the caller unchanged.
    pub async fn with_span<T, E, F, Fut>(
        &self,
        parent: Option<&SpanHandle>,
        name: &'static str,
        work: F,
    ) -> Result<T, E>
    where
        F: FnOnce(SpanHandle) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error,
    {
        let span = self.start(parent, name);
        span.clone().scope(work(span)).await
    }
}

/// Handle to a live span.
#[derive(Clone)]
pub struct SpanHandle {
    inner: Arc<SpanInner>,
}

struct SpanInner {
    trace_id: Uuid,
    span_id: u64,
    parent_id: Option<u64>,
    name: &'static str,
    started: Instant,
    tracer: Tracer,
    mirror: tracing::Span,
    state: Mutex<SpanState>,
}

#[derive(Default)]
struct SpanState {
    attributes: Vec<KeyValue>,
    status: SpanStatus,
    cause: Option<String>,
    ended: bool,
}

impl SpanHandle {
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn span_id(&self) -> u64 {
        self.inner.span_id
    }

    pub fn parent_id(&self) -> Option<u64> {
        self.inner.parent_id
    }

    pub fn trace_id(&self) -> Uuid {
        self.inner.trace_id
    }

    /// The mirrored `tracing` span, for instrumenting futures by hand.
    pub fn tracing_span(&self) -> &tracing::Span {
        &self.inner.mirror
    }

    /// Start a nested span under this one.
    pub fn child(&self, name: &'static str) -> SpanHandle {
        self.inner.tracer.start(Some(self), name)
    }

    /// Set one attribute, replacing an earlier value under the same key.
    pub fn set_attribute(&self, key: &'static str, value: impl Into<AttributeValue>) {
        let mut state = self.lock();
        if state.ended {
            tracing::warn!(span_name = self.inner.name, key, "Attribute set on ended span ignored");
            return;
        }
        let value = value.into();
        match state.attributes.iter_mut().find(|kv| kv.key == key) {
            Some(existing) => existing.value = value,
            None => state.attributes.push(KeyValue { key, value }),
        }
    }

    /// Record a stage's attribute set.
    pub fn record(&self, attributes: &impl SpanAttributes) {
        for kv in attributes.key_values() {
            self.set_attribute(kv.key, kv.value);
        }
    }

    /// Flag the span as failed. Does not end it.
    pub fn mark_failed(&self, message: impl Into<String>, cause: Option<&dyn Error>) {
        let mut state = self.lock();
        if state.ended {
            tracing::warn!(span_name = self.inner.name, "Failure recorded on ended span ignored");
            return;
        }
        state.status = SpanStatus::Error {
            message: message.into(),
        };
        state.cause = cause.map(describe_cause);
    }

    pub fn set_ok(&self) {
        let mut state = self.lock();
        if !state.ended {
            state.status = SpanStatus::Ok;
        }
    }

    pub fn status(&self) -> SpanStatus {
        self.lock().status.clone()
    }

    pub fn attribute(&self, key: &str) -> Option<AttributeValue> {
        self.lock()
            .attributes
            .iter()
            .find(|kv| kv.key == key)
            .map(|kv| kv.value.clone())
    }

    pub fn is_ended(&self) -> bool {
        self.lock().ended
    }

    /// End the span and export it. Returns `false` if it had already ended.
    pub fn end(&self) -> bool {
        let finished = {
            let mut state = self.lock();
            if state.ended {
                return false;
            }
            state.ended = true;
            FinishedSpan {
                trace_id: self.inner.trace_id,
                span_id: self.inner.span_id,
                parent_id: self.inner.parent_id,
                name: self.inner.name,
                attributes: std::mem::take(&mut state.attributes),
                status: state.status.clone(),
                cause: state.cause.take(),
                duration: self.inner.started.elapsed(),
            }
        };
        self.inner.tracer.sink.export_span(finished);
        true
    }

    /// Drive `work` inside this span, then end it.
    ///
    /// An `Err` from `work` marks the span failed with the error as cause.
    /// If the returned future is dropped before completing, the span still ends.
    pub async fn scope<T, E, Fut>(self, work: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Error,
    {
        let guard = EndOnDrop(self);
        let result = work.instrument(guard.0.inner.mirror.clone()).await;
        if let Err(err) = &result {
            guard.0.mark_failed(err.to_string(), Some(err as &dyn Error));
        }
        drop(guard);
        result
    }

    fn lock(&self) -> MutexGuard<'_, SpanState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SpanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanHandle")
            .field("name", &self.inner.name)
            .field("span_id", &self.inner.span_id)
            .field("parent_id", &self.inner.parent_id)
            .field("trace_id", &self.inner.trace_id)
            .finish()
    }
}

struct EndOnDrop(SpanHandle);

impl Drop for EndOnDrop {
    fn drop(&mut self) {
        self.0.end();
    }
}

/// Innermost-first description of an error's source chain.
fn describe_cause(err: &dyn Error) -> String {
    let mut parts = Vec::new();
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    if parts.is_empty() {
        err.to_string()
    } else {
        parts.join(": ")
    }
}
