// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for server-side call tracing

mod helpers;

use std::sync::Arc;

use helpers::{capture_logs, CountingTracer, RecordingListener};
use rpc_intercept::loopback::{call_unary, unary_handler, LoopbackChannel};
use rpc_intercept::{
    intercept_handler, CallOptions, Channel, Code, InMemoryReporter, Metadata, MethodDescriptor,
    Propagation, ServerCall, ServerCallHandler, ServerListener, SpanContext, Status,
    TraceServerInterceptor, SERVER_RECV, SERVER_SEND,
};
use tracing::Level;

const METHOD: &str = "test.Ledger/Post";

fn serve(
    handler: Arc<dyn ServerCallHandler>,
    propagation: Propagation,
) -> (LoopbackChannel, Arc<CountingTracer>, InMemoryReporter) {
    let reporter = InMemoryReporter::new();
    let tracer = CountingTracer::new(&reporter);
    let interceptor = TraceServerInterceptor::new(tracer.clone(), Arc::new(propagation));
    let handler = intercept_handler(handler, &[Arc::new(interceptor)]);
    (LoopbackChannel::new().with_handler(METHOD, handler), tracer, reporter)
}

fn echo() -> Arc<dyn ServerCallHandler> {
    unary_handler(|_, request| Ok(request))
}

fn b3_headers(parent: &SpanContext) -> Metadata {
    let mut headers = Metadata::new();
    headers.insert("x-b3-traceid", parent.trace_id().to_string()).unwrap();
    headers.insert("x-b3-spanid", parent.span_id().to_string()).unwrap();
    headers.insert("x-b3-sampled", "1").unwrap();
    headers
}

fn call(channel: &LoopbackChannel, headers: Metadata) -> Result<Vec<u8>, Status> {
    call_unary(
        channel,
        &MethodDescriptor::unary(METHOD),
        &CallOptions::new(),
        headers,
        b"entry".to_vec(),
    )
}

#[test]
fn test_server_span_continues_caller_trace() {
    let (channel, tracer, reporter) = serve(echo(), Propagation::B3);
    let caller = SpanContext::root(true);

    assert_eq!(call(&channel, b3_headers(&caller)).unwrap(), b"entry".to_vec());

    let span = reporter.spans().remove(0);
    assert_eq!(span.name, "handle RPC:test.Ledger/Post");
    assert_eq!(span.trace_id, caller.trace_id().to_string());
    assert_eq!(span.parent_id, Some(caller.span_id().to_string()));
    assert_eq!(span.event_names(), vec![SERVER_RECV, SERVER_SEND]);
    assert_eq!(tracer.created(), 1);
    assert_eq!(tracer.closed(), 1);
}

#[test]
fn test_missing_context_starts_new_trace() {
    let (channel, _tracer, reporter) = serve(echo(), Propagation::B3);
    let (_, logs) = capture_logs(|| call(&channel, Metadata::new()).unwrap());

    assert_eq!(reporter.spans()[0].parent_id, None);
    assert!(logs.at_level(Level::WARN).is_empty());
}

#[test]
fn test_malformed_context_warns_and_starts_new_trace() {
    let (channel, _tracer, reporter) = serve(echo(), Propagation::W3c);
    let mut headers = Metadata::new();
    headers.insert("traceparent", "00-not-a-trace-01").unwrap();

    let (reply, logs) = capture_logs(|| call(&channel, headers));

    assert!(reply.is_ok(), "Bad trace headers must not fail the call");
    assert_eq!(reporter.spans()[0].parent_id, None);
    let warnings = logs.at_level(Level::WARN);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message, "Failed to extract trace context; starting a new trace");
}

#[test]
fn test_unsampled_caller_is_not_reported() {
    let (channel, tracer, reporter) = serve(echo(), Propagation::B3);
    let caller = SpanContext::root(false);
    let mut headers = b3_headers(&caller);
    headers.insert("x-b3-sampled", "0").unwrap();

    call(&channel, headers).unwrap();

    assert_eq!(tracer.closed(), 1);
    assert!(reporter.is_empty());
}

#[test]
fn test_handler_error_logs_warning() {
    let failing = unary_handler(|_, _| Err(Status::new(Code::FailedPrecondition, "ledger closed")));
    let (channel, _tracer, reporter) = serve(failing, Propagation::B3);

    let (reply, logs) = capture_logs(|| call(&channel, Metadata::new()));

    let status = reply.unwrap_err();
    assert_eq!(status.code(), Code::FailedPrecondition);
    assert_eq!(status.description(), Some("ledger closed"));

    let warnings = logs.at_level(Level::WARN);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].fields.get("description").map(String::as_str),
        Some("ledger closed")
    );
    assert_eq!(reporter.spans()[0].tag("rpc.status_code"), Some("FAILED_PRECONDITION"));
}

/// Handler that never answers on its own; closes the call when cancelled.
struct StallingHandler;

struct StallingListener {
    call: Box<dyn ServerCall>,
}

impl ServerCallHandler for StallingHandler {
    fn start_call(&self, call: Box<dyn ServerCall>, _headers: Metadata) -> Box<dyn ServerListener> {
        Box::new(StallingListener { call })
    }
}

impl ServerListener for StallingListener {
    fn on_cancel(self: Box<Self>) {
        self.call.close(Status::ok(), Metadata::new());
    }
}

#[test]
fn test_cancel_releases_server_span_once() {
    let (channel, tracer, reporter) = serve(Arc::new(StallingHandler), Propagation::B3);

    let (listener, recorded) = RecordingListener::new();
    let mut client_call = channel.new_call(&MethodDescriptor::unary(METHOD), &CallOptions::new());
    client_call.start(Box::new(listener), Metadata::new());
    assert_eq!(tracer.closed(), 0, "Span stays open while the handler works");

    let (_, logs) = capture_logs(|| client_call.cancel("deadline"));

    assert_eq!(recorded.lock().unwrap().closes[0].0.code(), Code::Cancelled);
    assert_eq!(tracer.closed(), 1, "The late close must not release again");
    assert_eq!(logs.with_message("Call cancelled").len(), 1);

    let span = reporter.spans().remove(0);
    assert_eq!(span.tag("rpc.status_code"), Some("CANCELLED"));
    assert_eq!(span.event_names(), vec![SERVER_RECV]);
}
