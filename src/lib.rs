//! Composable RPC call interceptors with trace-context propagation.
//!
//! Interceptors wrap calls on both sides of an RPC boundary. They are
//! collected in registries during startup, sealed, and installed around a
//! [`Channel`] or [`ServerCallHandler`] in registration order, first
//! registered outermost. The bundled tracing interceptors open a span per
//! call, carry its context in the request headers, and close it exactly once
//! whatever way the call ends.
//!
//! ```rust
//! use std::sync::Arc;
//! use rpc_intercept::loopback::{call_unary, unary_handler, LoopbackChannel};
//! use rpc_intercept::{
//!     CallOptions, ClientInterceptorRegistry, InMemoryReporter, Metadata, MethodDescriptor,
//!     ServerInterceptorRegistry, TracingConfig, TracingConfigurer,
//! };
//!
//! let reporter = InMemoryReporter::new();
//! let tracing = TracingConfigurer::with_reporter(TracingConfig::default(), Arc::new(reporter.clone()));
//!
//! let server = ServerInterceptorRegistry::from_sources(&[&tracing]).unwrap();
//! let handler = server.apply(unary_handler(|_, request| Ok(request)));
//! let transport = LoopbackChannel::new().with_handler("echo.Echo/Say", handler);
//!
//! let client = ClientInterceptorRegistry::from_sources(&[&tracing]).unwrap();
//! let channel = client.apply(Arc::new(transport));
//!
//! let method = MethodDescriptor::unary("echo.Echo/Say");
//! call_unary(&*channel, &method, &CallOptions::new(), Metadata::new(), b"hi".to_vec()).unwrap();
//!
//! // One server span and one client span, in the same trace
//! let spans = reporter.spans();
//! assert_eq!(spans.len(), 2);
//! assert_eq!(spans[0].trace_id, spans[1].trace_id);
//! ```
//!
//! The crate logs through [`tracing`] and never installs a subscriber.

mod call;
mod config;
mod errors;
mod interceptor;
pub mod loopback;
mod registry;
mod spans;
pub mod trace;

pub use call::*;
pub use config::*;
pub use errors::*;
pub use interceptor::*;
pub use registry::*;
pub use trace::{
    B3Propagator, FinishedSpan, InMemoryReporter, LoggingReporter, NoopReporter, Propagation,
    Reporter, Sampler, Span, SpanContext, SpanEvent, SpanExtractor, SpanId, SpanInjector,
    StandardTracer, TraceClientInterceptor, TraceId, TraceServerInterceptor, Tracer,
    TracingConfigurer, W3cPropagator, CLIENT_RECV, CLIENT_SEND, SERVER_RECV, SERVER_SEND,
};
