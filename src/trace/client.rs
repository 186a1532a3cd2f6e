// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Client-side call tracing.

use std::sync::Arc;

use tracing::{debug, warn};

use super::guard::SpanGuard;
use super::{events, SpanContext, SpanInjector, Tracer};
use crate::call::{
    CallOptions, Channel, ClientCall, ClientListener, Metadata, MethodDescriptor, Status,
};
use crate::config::DEFAULT_CLIENT_SPAN_PREFIX;
use crate::interceptor::ClientInterceptor;

/// Opens a span around every outgoing call and propagates its context in
/// the request headers.
///
/// The span is named `"invoke RPC:" + method` by default and is a child of
/// [`CallOptions::parent`] when one is set. It records `cs` when the call
/// first becomes ready and `cr` when it closes, is tagged with the final
/// status code, and is closed exactly once.
///
/// Tracing never changes a call's outcome: a propagation failure is logged
/// and the call proceeds without trace headers, and the status and trailers
/// reach the application unchanged.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use rpc_intercept::trace::{Propagation, StandardTracer, TraceClientInterceptor};
///
/// let interceptor = TraceClientInterceptor::new(
///     Arc::new(StandardTracer::logging()),
///     Arc::new(Propagation::B3),
/// )
/// .with_span_prefix("call:");
/// ```
#[derive(Clone)]
pub struct TraceClientInterceptor {
    tracer: Arc<dyn Tracer>,
    injector: Arc<dyn SpanInjector>,
    span_prefix: String,
}

impl TraceClientInterceptor {
    pub fn new(tracer: Arc<dyn Tracer>, injector: Arc<dyn SpanInjector>) -> Self {
        Self {
            tracer,
            injector,
            span_prefix: DEFAULT_CLIENT_SPAN_PREFIX.to_string(),
        }
    }

    pub fn with_span_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.span_prefix = prefix.into();
        self
    }

    pub fn span_prefix(&self) -> &str {
        &self.span_prefix
    }
}

impl ClientInterceptor for TraceClientInterceptor {
    fn intercept_call(
        &self,
        method: &MethodDescriptor,
        options: &CallOptions,
        next: &dyn Channel,
    ) -> Box<dyn ClientCall> {
        Box::new(TracingClientCall {
            delegate: next.new_call(method, options),
            tracer: Arc::clone(&self.tracer),
            injector: Arc::clone(&self.injector),
            span_name: format!("{}{}", self.span_prefix, method.full_name()),
            parent: options.parent().copied(),
            method: method.full_name().to_string(),
        })
    }
}

struct TracingClientCall {
    delegate: Box<dyn ClientCall>,
    tracer: Arc<dyn Tracer>,
    injector: Arc<dyn SpanInjector>,
    span_name: String,
    parent: Option<SpanContext>,
    method: String,
}

impl ClientCall for TracingClientCall {
    fn start(&mut self, listener: Box<dyn ClientListener>, mut headers: Metadata) {
        let span = self.tracer.create_span(&self.span_name, self.parent.as_ref());

        if let Err(error) = self.injector.inject(&span, &mut headers) {
            warn!(
                method = %self.method,
                error = %error,
                "Failed to propagate trace context; sending call without it"
            );
        }

        let listener = TracingClientListener {
            delegate: listener,
            guard: SpanGuard::new(span, Arc::clone(&self.tracer)),
            method: self.method.clone(),
        };
        self.delegate.start(Box::new(listener), headers);
    }

    fn send_message(&mut self, message: Vec<u8>) {
        self.delegate.send_message(message);
    }

    fn half_close(&mut self) {
        self.delegate.half_close();
    }

    fn cancel(&mut self, reason: &str) {
        debug!(method = %self.method, reason, "Cancelling traced call");
        self.delegate.cancel(reason);
    }
}

struct TracingClientListener {
    delegate: Box<dyn ClientListener>,
    guard: SpanGuard,
    method: String,
}

impl ClientListener for TracingClientListener {
    fn on_headers(&mut self, headers: &Metadata) {
        self.delegate.on_headers(headers);
    }

    fn on_message(&mut self, message: Vec<u8>) {
        self.delegate.on_message(message);
    }

    fn on_ready(&mut self) {
        self.guard.mark_sent(events::CLIENT_SEND);
        self.delegate.on_ready();
    }

    fn on_close(self: Box<Self>, status: Status, trailers: Metadata) {
        let Self {
            delegate,
            mut guard,
            method,
        } = *self;

        guard.log_event(events::CLIENT_RECV);
        guard.record_status(&status, &method);
        guard.release();

        delegate.on_close(status, trailers);
    }
}
