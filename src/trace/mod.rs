//! RPC call tracing.
//!
//! The tracing interceptors wrap every call in a span:
//!
//! ```text
//! client                                    server
//! invoke RPC:svc/M  ── traceparent/B3 ──>   handle RPC:svc/M
//!   cs (first on_ready)                       sr (call arrives)
//!   cr (on_close)                             ss (close)
//! ```
//!
//! The server span is a child of the client span: same trace id, parent id
//! equal to the client span id. Spans are created through a [`Tracer`] and
//! handed to a [`Reporter`] when closed; context crosses the wire through a
//! [`SpanInjector`] / [`SpanExtractor`] pair.

mod client;
mod configurer;
mod context;
mod guard;
pub mod propagation;
mod reporter;
mod server;
mod span;
mod tracer;

pub use client::TraceClientInterceptor;
pub use configurer::TracingConfigurer;
pub use context::{SpanContext, SpanId, TraceId};
pub use propagation::{B3Propagator, Propagation, SpanExtractor, SpanInjector, W3cPropagator};
pub use reporter::{InMemoryReporter, LoggingReporter, NoopReporter, Reporter};
pub use server::TraceServerInterceptor;
pub use span::{FinishedSpan, Span, SpanEvent};
pub use tracer::{Sampler, StandardTracer, Tracer};

/// Names of the events logged on RPC spans.
pub mod events {
    /// Client sent the request (first `on_ready`).
    pub const CLIENT_SEND: &str = "cs";
    /// Client received the final status.
    pub const CLIENT_RECV: &str = "cr";
    /// Server received the call.
    pub const SERVER_RECV: &str = "sr";
    /// Server sent the final status.
    pub const SERVER_SEND: &str = "ss";
}

pub use events::{CLIENT_RECV, CLIENT_SEND, SERVER_RECV, SERVER_SEND};
