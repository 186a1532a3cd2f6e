//! Span creation and sampling.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{LoggingReporter, Reporter, Span, SpanContext, SpanId, TraceId};

/// Creates and closes spans.
///
/// The tracing interceptors only go through this trait, so any tracer backend
/// can be plugged in. [`StandardTracer`] is the bundled implementation.
pub trait Tracer: Send + Sync {
    /// Starts a span. With a parent, the span joins the parent's trace and
    /// inherits its sampling decision; without one it starts a new trace.
    fn create_span(&self, name: &str, parent: Option<&SpanContext>) -> Span;

    /// Ends a span.
    fn close(&self, span: Span);
}

/// Decides whether a new trace is recorded.
///
/// Only root spans consult the sampler. Child spans always follow their
/// parent, so a trace is recorded on every hop or on none.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Sampler {
    #[default]
    Always,
    Never,
    /// Records the given fraction of traces, decided from the trace id so
    /// every process agrees.
    Ratio(f64),
}

impl Sampler {
    /// A ratio sampler. `1.0` and above become [`Sampler::Always`]; zero,
    /// negative, and NaN become [`Sampler::Never`].
    pub fn ratio(rate: f64) -> Self {
        if rate >= 1.0 {
            Self::Always
        } else if rate > 0.0 {
            Self::Ratio(rate)
        } else {
            Self::Never
        }
    }

    pub fn is_sampled(&self, trace_id: TraceId) -> bool {
        match *self {
            Self::Always => true,
            Self::Never => false,
            Self::Ratio(rate) if rate >= 1.0 => true,
            Self::Ratio(rate) if rate > 0.0 => {
                let threshold = (rate * u64::MAX as f64) as u64;
                (trace_id.as_u128() as u64) < threshold
            }
            Self::Ratio(_) => false,
        }
    }
}

/// The bundled tracer: random ids, a [`Sampler`] for new traces, and a
/// [`Reporter`] for closed spans that were sampled.
#[derive(Clone)]
pub struct StandardTracer {
    sampler: Sampler,
    reporter: Arc<dyn Reporter>,
}

impl StandardTracer {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self {
            sampler: Sampler::Always,
            reporter,
        }
    }

    /// A tracer that samples everything and logs spans as JSON.
    pub fn logging() -> Self {
        Self::new(Arc::new(LoggingReporter))
    }

    pub fn with_sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn sampler(&self) -> Sampler {
        self.sampler
    }
}

impl Tracer for StandardTracer {
    fn create_span(&self, name: &str, parent: Option<&SpanContext>) -> Span {
        let context = match parent {
            Some(parent) => parent.child(),
            None => {
                let trace_id = TraceId::random();
                SpanContext::new(trace_id, SpanId::random(), None, self.sampler.is_sampled(trace_id))
            }
        };

        debug!(
            span = name,
            trace_id = %context.trace_id(),
            span_id = %context.span_id(),
            sampled = context.is_sampled(),
            "Created span"
        );
        Span::new(name, context)
    }

    fn close(&self, span: Span) {
        let sampled = span.context().is_sampled();
        let finished = span.finish();
        debug!(
            span = %finished.name,
            duration_us = finished.duration_us,
            sampled,
            "Closed span"
        );
        if sampled {
            self.reporter.report(finished);
        }
    }
}

impl fmt::Debug for StandardTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardTracer")
            .field("sampler", &self.sampler)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::InMemoryReporter;

    #[test]
    fn test_ratio_normalization() {
        assert_eq!(Sampler::ratio(1.0), Sampler::Always);
        assert_eq!(Sampler::ratio(3.0), Sampler::Always);
        assert_eq!(Sampler::ratio(0.0), Sampler::Never);
        assert_eq!(Sampler::ratio(-1.0), Sampler::Never);
        assert_eq!(Sampler::ratio(f64::NAN), Sampler::Never);
        assert_eq!(Sampler::ratio(0.5), Sampler::Ratio(0.5));
    }

    #[test]
    fn test_ratio_decision_uses_low_trace_bits() {
        let sampler = Sampler::Ratio(0.5);
        assert!(sampler.is_sampled(TraceId::new(1).unwrap()));
        assert!(!sampler.is_sampled(TraceId::new(u64::MAX as u128).unwrap()));
    }

    #[test]
    fn test_child_span_joins_parent_trace() {
        let tracer = StandardTracer::new(Arc::new(InMemoryReporter::new()));
        let root = tracer.create_span("root", None);
        let child = tracer.create_span("child", Some(root.context()));

        assert_eq!(child.context().trace_id(), root.context().trace_id());
        assert_eq!(child.context().parent_id(), Some(root.context().span_id()));
    }

    #[test]
    fn test_unsampled_spans_not_reported() {
        let reporter = InMemoryReporter::new();
        let tracer = StandardTracer::new(Arc::new(reporter.clone())).with_sampler(Sampler::Never);

        let root = tracer.create_span("root", None);
        let child = tracer.create_span("child", Some(root.context()));
        assert!(!child.context().is_sampled());

        tracer.close(child);
        tracer.close(root);
        assert!(reporter.is_empty());
    }

    #[test]
    fn test_sampled_parent_overrides_never_sampler() {
        let reporter = InMemoryReporter::new();
        let tracer = StandardTracer::new(Arc::new(reporter.clone())).with_sampler(Sampler::Never);

        let remote = SpanContext::root(true);
        tracer.close(tracer.create_span("child", Some(&remote)));
        assert_eq!(reporter.len(), 1);
    }
}
