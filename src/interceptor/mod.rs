// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Interceptors and interceptor chains.
//!
//! An interceptor wraps a call to observe or modify it without changing its
//! RPC semantics. Chains are ordered: the first interceptor in the list is the
//! outermost, so it sees the call start first and the call close last.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use rpc_intercept::loopback::{call_unary, unary_handler, LoopbackChannel};
//! use rpc_intercept::{
//!     intercept_channel, AttachHeadersInterceptor, CallOptions, ClientInterceptorRegistry,
//!     InMemoryReporter, Metadata, MethodDescriptor, Propagation, StandardTracer,
//!     TraceClientInterceptor,
//! };
//!
//! let mut auth_headers = Metadata::new();
//! auth_headers.insert("authorization", "Bearer t0ken")?;
//! let auth = Arc::new(AttachHeadersInterceptor::new(auth_headers));
//!
//! let reporter = InMemoryReporter::new();
//! let tracer = Arc::new(StandardTracer::new(Arc::new(reporter.clone())));
//! let tracing = Arc::new(TraceClientInterceptor::new(tracer, Arc::new(Propagation::B3)));
//!
//! let registry = ClientInterceptorRegistry::new();
//! registry.register(auth)?.register(tracing)?;
//!
//! let transport = Arc::new(LoopbackChannel::new().with_handler(
//!     "echo.Echo/Say",
//!     unary_handler(|headers, _| Ok(headers.get("authorization").unwrap_or_default().as_bytes().to_vec())),
//! ));
//!
//! // `auth` wraps `tracing`, which wraps the transport
//! let channel = intercept_channel(transport, &registry.get_all());
//!
//! let method = MethodDescriptor::unary("echo.Echo/Say");
//! let reply = call_unary(&*channel, &method, &CallOptions::new(), Metadata::new(), Vec::new());
//! assert_eq!(reply.ok(), Some(b"Bearer t0ken".to_vec()));
//! assert_eq!(reporter.len(), 1);
//! # Ok::<(), rpc_intercept::Error>(())
//! ```
//!
//! ## As Tower layers
//!
//! ```rust
//! use std::sync::Arc;
//! use rpc_intercept::loopback::LoopbackChannel;
//! use rpc_intercept::{Channel, ClientInterceptorLayer, Propagation, StandardTracer, TraceClientInterceptor};
//! use tower::Layer;
//!
//! let tracing = TraceClientInterceptor::new(Arc::new(StandardTracer::logging()), Arc::new(Propagation::W3c));
//! let transport: Arc<dyn Channel> = Arc::new(LoopbackChannel::new());
//! let channel = ClientInterceptorLayer::new(tracing).layer(transport);
//! # let _ = channel;
//! ```

mod chain;
mod headers;
mod layer;

pub use chain::{intercept_channel, intercept_handler, InterceptedChannel, InterceptedHandler};
pub use headers::AttachHeadersInterceptor;
pub use layer::{ClientInterceptorLayer, ServerInterceptorLayer};

use crate::call::{
    CallOptions, Channel, ClientCall, Metadata, MethodDescriptor, ServerCall, ServerCallHandler,
    ServerListener,
};

/// Wraps outgoing calls.
///
/// Implementations create the next call with `next.new_call(method, options)`
/// and return a [`ClientCall`] that forwards to it. The returned call must
/// forward `start` exactly once.
pub trait ClientInterceptor: Send + Sync {
    fn intercept_call(
        &self,
        method: &MethodDescriptor,
        options: &CallOptions,
        next: &dyn Channel,
    ) -> Box<dyn ClientCall>;
}

/// Wraps incoming calls.
///
/// Implementations may wrap `call` before passing it to
/// `next.start_call(call, headers)`, and may wrap the listener it returns.
pub trait ServerInterceptor: Send + Sync {
    fn intercept_call(
        &self,
        call: Box<dyn ServerCall>,
        headers: Metadata,
        next: &dyn ServerCallHandler,
    ) -> Box<dyn ServerListener>;
}
