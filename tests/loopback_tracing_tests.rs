// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests: traced client and traced server over the loopback
//! transport

mod helpers;

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use helpers::CountingTracer;
use rpc_intercept::loopback::{call_unary, unary_handler, LoopbackChannel};
use rpc_intercept::{
    CallOptions, Channel, ClientInterceptorRegistry, Code, FinishedSpan, InMemoryReporter,
    Metadata, MethodDescriptor, Propagation, ServerInterceptorRegistry, Status, TracingConfig,
    TracingConfigBuilder, TracingConfigurer,
};

const ECHO: &str = "test.Echo/Say";
const SAMPLED: &str = "test.Echo/Sampled";
const MISSING: &str = "test.Echo/Missing";

struct Stack {
    channel: Arc<dyn Channel>,
    reporter: InMemoryReporter,
    tracer: Arc<CountingTracer>,
}

fn stack(config: TracingConfig) -> Stack {
    let reporter = InMemoryReporter::new();
    let tracer = CountingTracer::with_sampler(&reporter, config.sampler());
    let tracing = TracingConfigurer::new(config, tracer.clone());

    let server = ServerInterceptorRegistry::from_sources(&[&tracing]).unwrap();
    let transport = LoopbackChannel::new()
        .with_handler(ECHO, server.apply(unary_handler(|_, request| Ok(request))))
        .with_handler(
            SAMPLED,
            server.apply(unary_handler(|headers, _| {
                Ok(headers.get("x-b3-sampled").unwrap_or("absent").as_bytes().to_vec())
            })),
        );

    let client = ClientInterceptorRegistry::from_sources(&[&tracing]).unwrap();
    Stack {
        channel: client.apply(Arc::new(transport)),
        reporter,
        tracer,
    }
}

fn invoke(stack: &Stack, method: &str, body: &[u8]) -> Result<Vec<u8>, Status> {
    call_unary(
        &*stack.channel,
        &MethodDescriptor::unary(method),
        &CallOptions::new(),
        Metadata::new(),
        body.to_vec(),
    )
}

fn split(spans: Vec<FinishedSpan>) -> (Vec<FinishedSpan>, Vec<FinishedSpan>) {
    spans
        .into_iter()
        .partition(|span| span.name.starts_with("invoke RPC:"))
}

#[test]
fn test_server_span_is_child_of_client_span() {
    let stack = stack(TracingConfig::default());
    assert_eq!(invoke(&stack, ECHO, b"hello").unwrap(), b"hello".to_vec());

    let (client, server) = split(stack.reporter.spans());
    assert_eq!((client.len(), server.len()), (1, 1));

    let (client, server) = (&client[0], &server[0]);
    assert_eq!(client.name, "invoke RPC:test.Echo/Say");
    assert_eq!(server.name, "handle RPC:test.Echo/Say");
    assert_eq!(server.trace_id, client.trace_id);
    assert_eq!(server.parent_id.as_deref(), Some(client.span_id.as_str()));
    assert_eq!(client.event_names(), vec!["cs", "cr"]);
    assert_eq!(server.event_names(), vec!["sr", "ss"]);

    assert_eq!(stack.tracer.created(), 2);
    assert_eq!(stack.tracer.closed(), 2);
}

#[test]
fn test_w3c_propagation_end_to_end() {
    let stack = stack(TracingConfigBuilder::new().propagation(Propagation::W3c).build());
    invoke(&stack, ECHO, b"x").unwrap();

    let (client, server) = split(stack.reporter.spans());
    assert_eq!(server[0].trace_id, client[0].trace_id);
    assert_eq!(server[0].parent_id.as_deref(), Some(client[0].span_id.as_str()));
}

#[test]
fn test_unsampled_trace_propagates_decision() {
    let stack = stack(TracingConfigBuilder::new().sample_rate(0.0).build());

    assert_eq!(invoke(&stack, SAMPLED, b"").unwrap(), b"0".to_vec());
    assert!(stack.reporter.is_empty(), "Neither side reports an unsampled trace");
    assert_eq!(stack.tracer.closed(), 2);
}

#[test]
fn test_disabled_tracing_installs_nothing() {
    let stack = stack(TracingConfig::disabled());

    assert_eq!(invoke(&stack, SAMPLED, b"").unwrap(), b"absent".to_vec());
    assert_eq!(stack.tracer.created(), 0);
}

#[test]
fn test_unknown_method_traced_as_unimplemented() {
    let stack = stack(TracingConfig::default());

    let status = invoke(&stack, MISSING, b"").unwrap_err();
    assert_eq!(status.code(), Code::Unimplemented);

    let spans = stack.reporter.spans();
    assert_eq!(spans.len(), 1, "Only the client side saw the call");
    assert_eq!(spans[0].tag("rpc.status_code"), Some("UNIMPLEMENTED"));
    assert_eq!(spans[0].event_names(), vec!["cr"], "Never became ready");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_keep_traces_apart() {
    const CALLS: usize = 64;
    let stack = Arc::new(stack(TracingConfig::default()));

    let tasks = (0..CALLS).map(|i| {
        let stack = Arc::clone(&stack);
        tokio::spawn(async move {
            let body = format!("call-{i}").into_bytes();
            let reply = invoke(&stack, ECHO, &body).unwrap();
            assert_eq!(reply, body);
        })
    });
    for result in join_all(tasks).await {
        result.unwrap();
    }

    let (client, server) = split(stack.reporter.spans());
    assert_eq!(client.len(), CALLS);
    assert_eq!(server.len(), CALLS);

    let traces: HashSet<&str> = client.iter().map(|span| span.trace_id.as_str()).collect();
    assert_eq!(traces.len(), CALLS, "Every call starts its own trace");

    let client_spans: HashSet<(&str, &str)> = client
        .iter()
        .map(|span| (span.trace_id.as_str(), span.span_id.as_str()))
        .collect();
    for span in &server {
        let parent = span.parent_id.as_deref().unwrap();
        assert!(client_spans.contains(&(span.trace_id.as_str(), parent)));
    }

    assert_eq!(stack.tracer.created(), 2 * CALLS);
    assert_eq!(stack.tracer.closed(), 2 * CALLS);
}
