//! Span reporters.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use super::FinishedSpan;

/// Receives every sampled span once it is closed.
pub trait Reporter: Send + Sync {
    fn report(&self, span: FinishedSpan);
}

/// Discards spans.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn report(&self, _span: FinishedSpan) {}
}

/// Writes each span as one JSON `DEBUG` event under the
/// `rpc_intercept::spans` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingReporter;

impl Reporter for LoggingReporter {
    fn report(&self, span: FinishedSpan) {
        match serde_json::to_string(&span) {
            Ok(json) => debug!(target: "rpc_intercept::spans", span = %json, "Span finished"),
            Err(e) => warn!(span = %span.name, error = %e, "Failed to serialize finished span"),
        }
    }
}

/// Keeps spans in memory. Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct InMemoryReporter {
    spans: Arc<Mutex<Vec<FinishedSpan>>>,
}

impl InMemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the reported spans, oldest first.
    pub fn spans(&self) -> Vec<FinishedSpan> {
        self.spans.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.spans.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.spans.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Reporter for InMemoryReporter {
    fn report(&self, span: FinishedSpan) {
        self.spans.lock().unwrap_or_else(PoisonError::into_inner).push(span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{Span, SpanContext};

    #[test]
    fn test_in_memory_clones_share_buffer() {
        let reporter = InMemoryReporter::new();
        let clone = reporter.clone();
        clone.report(Span::new("a", SpanContext::root(true)).finish());

        assert_eq!(reporter.len(), 1);
        assert_eq!(reporter.spans()[0].name, "a");

        reporter.clear();
        assert!(clone.is_empty());
    }
}
