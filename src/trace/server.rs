// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Server-side call tracing.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::guard::{self, CallState, SharedSpanGuard, SpanGuard, STATUS_CODE_TAG};
use super::{events, SpanExtractor, Tracer};
use crate::call::{
    Code, Metadata, MethodDescriptor, ServerCall, ServerCallHandler, ServerListener, Status,
};
use crate::config::DEFAULT_SERVER_SPAN_PREFIX;
use crate::interceptor::ServerInterceptor;

/// Opens a span around every incoming call, continuing the caller's trace
/// when the request headers carry one.
///
/// The span is named `"handle RPC:" + method` by default. It records `sr` as
/// soon as the call arrives and `ss` when the handler closes it. A cancelled
/// call releases the span from the listener side instead. Unparseable trace
/// headers are logged and the call starts a new trace.
#[derive(Clone)]
pub struct TraceServerInterceptor {
    tracer: Arc<dyn Tracer>,
    extractor: Arc<dyn SpanExtractor>,
    span_prefix: String,
}

impl TraceServerInterceptor {
    pub fn new(tracer: Arc<dyn Tracer>, extractor: Arc<dyn SpanExtractor>) -> Self {
        Self {
            tracer,
            extractor,
            span_prefix: DEFAULT_SERVER_SPAN_PREFIX.to_string(),
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

impl ServerInterceptor for TraceServerInterceptor {
    fn intercept_call(
        &self,
        call: Box<dyn ServerCall>,
        headers: Metadata,
        next: &dyn ServerCallHandler,
    ) -> Box<dyn ServerListener> {
        let method = call.method().full_name().to_string();

        let parent = self.extractor.extract(&headers).unwrap_or_else(|error| {
            warn!(
                method = %method,
                error = %error,
                "Failed to extract trace context; starting a new trace"
            );
            None
        });

        let span_name = format!("{}{}", self.span_prefix, method);
        let mut span = self.tracer.create_span(&span_name, parent.as_ref());
        span.log_event(events::SERVER_RECV);

        let slot: SharedSpanGuard = Arc::new(Mutex::new(SpanGuard::new(span, Arc::clone(&self.tracer))));

        let call = TracingServerCall {
            delegate: call,
            guard: Arc::clone(&slot),
            method: method.clone(),
        };
        let listener = next.start_call(Box::new(call), headers);

        Box::new(TracingServerListener {
            delegate: listener,
            guard: slot,
            method,
        })
    }
}

struct TracingServerCall {
    delegate: Box<dyn ServerCall>,
    guard: SharedSpanGuard,
    method: String,
}

impl ServerCall for TracingServerCall {
    fn method(&self) -> &MethodDescriptor {
        self.delegate.method()
    }

    fn send_headers(&mut self, headers: Metadata) {
        self.delegate.send_headers(headers);
    }

    fn send_message(&mut self, message: Vec<u8>) {
        self.delegate.send_message(message);
    }

    fn close(self: Box<Self>, status: Status, trailers: Metadata) {
        let Self {
            delegate,
            guard: slot,
            method,
        } = *self;

        {
            let mut guard = guard::lock(&slot);
            guard.log_event(events::SERVER_SEND);
            guard.record_status(&status, &method);
            guard.release();
        }

        delegate.close(status, trailers);
    }
}

struct TracingServerListener {
    delegate: Box<dyn ServerListener>,
    guard: SharedSpanGuard,
    method: String,
}

impl ServerListener for TracingServerListener {
    fn on_message(&mut self, message: Vec<u8>) {
        self.delegate.on_message(message);
    }

    fn on_half_close(&mut self) {
        self.delegate.on_half_close();
    }

    fn on_ready(&mut self) {
        self.delegate.on_ready();
    }

    fn on_cancel(self: Box<Self>) {
        let Self {
            delegate,
            guard: slot,
            method,
        } = *self;

        {
            let mut guard = guard::lock(&slot);
            if guard.state() != CallState::Closed {
                debug!(method = %method, "Call cancelled");
                guard.tag(STATUS_CODE_TAG, Code::Cancelled.as_str());
                guard.release();
            }
        }

        delegate.on_cancel();
    }

    fn on_complete(self: Box<Self>) {
        self.delegate.on_complete();
    }
}
