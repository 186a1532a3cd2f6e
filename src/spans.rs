//! `tracing` span creation helpers.
//!
//! Span construction is kept out of the interceptor logic: each instrumented
//! operation has a helper here that builds its `tracing::Span` with the
//! fields subscribers should see.
//!
//! Usage pattern:
//! ```text
//! let span = spans::build_chain("client", interceptors.len());
//! let _guard = span.entered();
//! ```

use tracing::Span;

use crate::trace::SpanContext;

/// Create the `tracing` span mirroring one RPC trace span.
///
/// Parent: whatever span is current where the call is started
/// Children: span events logged on the RPC span (`cs`, `cr`, `sr`, `ss`)
#[inline]
pub(crate) fn rpc_span(name: &str, context: &SpanContext) -> Span {
    let span = tracing::info_span!(
        "rpc_intercept.rpc",
        span.name = %name,
        trace_id = %context.trace_id(),
        span_id = %context.span_id(),
        parent_id = tracing::field::Empty,
        sampled = context.is_sampled(),
        duration_us = tracing::field::Empty,
    );
    if let Some(parent) = context.parent_id() {
        span.record("parent_id", tracing::field::display(parent));
    }
    span
}

/// Create span for installing an interceptor chain.
///
/// Parent: None (runs once per channel or server at startup)
#[inline]
pub(crate) fn build_chain(side: &'static str, interceptors: usize) -> Span {
    tracing::debug_span!(
        "rpc_intercept.build_chain",
        side = side,
        interceptors = interceptors,
    )
}
