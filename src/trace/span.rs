//! Trace spans.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SpanContext;
use crate::spans;

/// A named event logged on a span, such as `cs` or `sr`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEvent {
    pub name: String,
    pub at: DateTime<Utc>,
}

/// An open span.
///
/// Spans are created and closed by a [`Tracer`](super::Tracer). Every span is
/// mirrored by a `tracing` span carrying its ids, so subscribers see RPC
/// spans even without a reporter.
#[derive(Debug)]
pub struct Span {
    name: String,
    context: SpanContext,
    started_at: DateTime<Utc>,
    start: Instant,
    events: Vec<SpanEvent>,
    tags: BTreeMap<String, String>,
    inner: tracing::Span,
}

impl Span {
    pub fn new(name: impl Into<String>, context: SpanContext) -> Self {
        let name = name.into();
        let inner = spans::rpc_span(&name, &context);
        Self {
            name,
            context,
            started_at: Utc::now(),
            start: Instant::now(),
            events: Vec::new(),
            tags: BTreeMap::new(),
            inner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &SpanContext {
        &self.context
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn events(&self) -> &[SpanEvent] {
        &self.events
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// The `tracing` span mirroring this one.
    pub fn tracing_span(&self) -> &tracing::Span {
        &self.inner
    }

    pub fn log_event(&mut self, event: &str) {
        tracing::trace!(parent: &self.inner, event = event, "Span event");
        self.events.push(SpanEvent {
            name: event.to_string(),
            at: Utc::now(),
        });
    }

    /// Sets a tag, replacing any previous value for `key`.
    pub fn tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Ends the span and returns its reportable form.
    pub fn finish(self) -> FinishedSpan {
        let duration_us = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.inner.record("duration_us", duration_us);

        FinishedSpan {
            name: self.name,
            trace_id: self.context.trace_id().to_string(),
            span_id: self.context.span_id().to_string(),
            parent_id: self.context.parent_id().map(|id| id.to_string()),
            sampled: self.context.is_sampled(),
            started_at: self.started_at,
            duration_us,
            events: self.events,
            tags: self.tags,
        }
    }
}

/// A closed span, ready for a [`Reporter`](super::Reporter).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedSpan {
    pub name: String,
    pub trace_id: String,
    pub span_id: String,
    pub parent_id: Option<String>,
    pub sampled: bool,
    pub started_at: DateTime<Utc>,
    pub duration_us: u64,
    pub events: Vec<SpanEvent>,
    pub tags: BTreeMap<String, String>,
}

impl FinishedSpan {
    /// Names of the logged events, in order.
    pub fn event_names(&self) -> Vec<&str> {
        self.events.iter().map(|event| event.name.as_str()).collect()
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}
