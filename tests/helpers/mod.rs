// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for rpc-intercept integration tests
//!
//! Provides scripted transports, recording listeners, instrumented tracers
//! and a log capture layer, so interceptor behavior can be observed without
//! a real RPC runtime.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rpc_intercept::{
    CallOptions, Channel, ClientCall, ClientInterceptor, ClientListener, InMemoryReporter,
    Metadata, MethodDescriptor, PropagationError, Sampler, ServerCall, ServerCallHandler,
    ServerInterceptor, ServerListener, Span, SpanContext, SpanInjector, StandardTracer, Status,
    Tracer,
};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Ordered, shared record of what happened during a test.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// What a [`RecordingListener`] saw.
#[derive(Debug, Default)]
pub struct Recorded {
    pub headers: Vec<Metadata>,
    pub messages: Vec<Vec<u8>>,
    pub ready: usize,
    pub closes: Vec<(Status, Metadata)>,
}

/// Client listener that records every notification.
///
/// # Example
///
/// ```rust,ignore
/// let (listener, recorded) = RecordingListener::new();
/// call.start(Box::new(listener), Metadata::new());
/// assert_eq!(recorded.lock().unwrap().closes.len(), 1);
/// ```
pub struct RecordingListener {
    recorded: Arc<Mutex<Recorded>>,
    log: Option<EventLog>,
}

impl RecordingListener {
    pub fn new() -> (Self, Arc<Mutex<Recorded>>) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        (
            Self {
                recorded: Arc::clone(&recorded),
                log: None,
            },
            recorded,
        )
    }

    /// Also appends `"app-close"` to `log` when the call closes.
    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = Some(log);
        self
    }
}

impl ClientListener for RecordingListener {
    fn on_headers(&mut self, headers: &Metadata) {
        self.recorded.lock().unwrap().headers.push(headers.clone());
    }

    fn on_message(&mut self, message: Vec<u8>) {
        self.recorded.lock().unwrap().messages.push(message);
    }

    fn on_ready(&mut self) {
        self.recorded.lock().unwrap().ready += 1;
    }

    fn on_close(self: Box<Self>, status: Status, trailers: Metadata) {
        if let Some(log) = &self.log {
            log.push("app-close");
        }
        self.recorded.lock().unwrap().closes.push((status, trailers));
    }
}

/// How a [`ScriptedChannel`] call behaves once started.
#[derive(Clone, Debug)]
pub enum Script {
    /// Signal `on_ready` `ready` times, then close with `status` and `trailers`.
    Respond {
        ready: usize,
        status: Status,
        trailers: Metadata,
    },
    /// Drop the listener without ever closing the call.
    Abandon,
    /// Keep the listener until the call is cancelled.
    Hang,
}

impl Script {
    pub fn ok() -> Self {
        Self::status(Status::ok())
    }

    pub fn status(status: Status) -> Self {
        Self::Respond {
            ready: 1,
            status,
            trailers: Metadata::new(),
        }
    }
}

/// A transport stand-in that records the headers each call starts with and
/// then follows a [`Script`].
#[derive(Clone)]
pub struct ScriptedChannel {
    script: Script,
    started: Arc<Mutex<Vec<Metadata>>>,
    log: EventLog,
}

impl ScriptedChannel {
    pub fn new(script: Script) -> Self {
        Self::with_log(script, EventLog::new())
    }

    /// Appends `"real-call"` to `log` when a call starts.
    pub fn with_log(script: Script, log: EventLog) -> Self {
        Self {
            script,
            started: Arc::new(Mutex::new(Vec::new())),
            log,
        }
    }

    /// Headers of every started call, in order.
    pub fn started_headers(&self) -> Vec<Metadata> {
        self.started.lock().unwrap().clone()
    }
}

impl Channel for ScriptedChannel {
    fn new_call(&self, _method: &MethodDescriptor, _options: &CallOptions) -> Box<dyn ClientCall> {
        Box::new(ScriptedCall {
            channel: self.clone(),
            listener: None,
        })
    }
}

struct ScriptedCall {
    channel: ScriptedChannel,
    listener: Option<Box<dyn ClientListener>>,
}

impl ClientCall for ScriptedCall {
    fn start(&mut self, mut listener: Box<dyn ClientListener>, headers: Metadata) {
        self.channel.log.push("real-call");
        self.channel.started.lock().unwrap().push(headers);

        match self.channel.script.clone() {
            Script::Respond {
                ready,
                status,
                trailers,
            } => {
                for _ in 0..ready {
                    listener.on_ready();
                }
                listener.on_close(status, trailers);
            }
            Script::Abandon => drop(listener),
            Script::Hang => self.listener = Some(listener),
        }
    }

    fn send_message(&mut self, _message: Vec<u8>) {}

    fn half_close(&mut self) {}

    fn cancel(&mut self, reason: &str) {
        if let Some(listener) = self.listener.take() {
            listener.on_close(Status::cancelled(reason), Metadata::new());
        }
    }
}

/// Client interceptor that logs `"<name>-start"` and `"<name>-close"`.
pub struct OrderInterceptor {
    name: &'static str,
    log: EventLog,
}

impl OrderInterceptor {
    pub fn new(name: &'static str, log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            log: log.clone(),
        })
    }
}

impl ClientInterceptor for OrderInterceptor {
    fn intercept_call(
        &self,
        method: &MethodDescriptor,
        options: &CallOptions,
        next: &dyn Channel,
    ) -> Box<dyn ClientCall> {
        Box::new(OrderCall {
            delegate: next.new_call(method, options),
            name: self.name,
            log: self.log.clone(),
        })
    }
}

struct OrderCall {
    delegate: Box<dyn ClientCall>,
    name: &'static str,
    log: EventLog,
}

impl ClientCall for OrderCall {
    fn start(&mut self, listener: Box<dyn ClientListener>, headers: Metadata) {
        self.log.push(format!("{}-start", self.name));
        let listener = OrderListener {
            delegate: listener,
            name: self.name,
            log: self.log.clone(),
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
        self.delegate.cancel(reason);
    }
}

struct OrderListener {
    delegate: Box<dyn ClientListener>,
    name: &'static str,
    log: EventLog,
}

impl ClientListener for OrderListener {
    fn on_headers(&mut self, headers: &Metadata) {
        self.delegate.on_headers(headers);
    }

    fn on_ready(&mut self) {
        self.delegate.on_ready();
    }

    fn on_message(&mut self, message: Vec<u8>) {
        self.delegate.on_message(message);
    }

    fn on_close(self: Box<Self>, status: Status, trailers: Metadata) {
        self.log.push(format!("{}-close", self.name));
        self.delegate.on_close(status, trailers);
    }
}

/// Server interceptor that logs `"<name>-start"` when a call arrives.
pub struct ServerOrderInterceptor {
    name: &'static str,
    log: EventLog,
}

impl ServerOrderInterceptor {
    pub fn new(name: &'static str, log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            log: log.clone(),
        })
    }
}

impl ServerInterceptor for ServerOrderInterceptor {
    fn intercept_call(
        &self,
        call: Box<dyn ServerCall>,
        headers: Metadata,
        next: &dyn ServerCallHandler,
    ) -> Box<dyn ServerListener> {
        self.log.push(format!("{}-start", self.name));
        next.start_call(call, headers)
    }
}

/// Tracer wrapper that counts span creation and closing.
pub struct CountingTracer {
    inner: StandardTracer,
    created: AtomicUsize,
    closed: AtomicUsize,
}

impl CountingTracer {
    pub fn new(reporter: &InMemoryReporter) -> Arc<Self> {
        Self::with_sampler(reporter, Sampler::Always)
    }

    pub fn with_sampler(reporter: &InMemoryReporter, sampler: Sampler) -> Arc<Self> {
        Arc::new(Self {
            inner: StandardTracer::new(Arc::new(reporter.clone())).with_sampler(sampler),
            created: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
        })
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Tracer for CountingTracer {
    fn create_span(&self, name: &str, parent: Option<&SpanContext>) -> Span {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.inner.create_span(name, parent)
    }

    fn close(&self, span: Span) {
        self.closed.fetch_add(1, Ordering::SeqCst);
        self.inner.close(span);
    }
}

/// Injector that always fails.
pub struct FailingInjector;

#[derive(Debug)]
struct InjectorDown;

impl fmt::Display for InjectorDown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("injector down")
    }
}

impl std::error::Error for InjectorDown {}

impl SpanInjector for FailingInjector {
    fn inject(&self, _span: &Span, _headers: &mut Metadata) -> Result<(), PropagationError> {
        Err(PropagationError::tracer("inject", InjectorDown))
    }
}

/// One captured log record.
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

/// `tracing-subscriber` layer that keeps every event in memory.
#[derive(Clone, Default)]
pub struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureLayer {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn at_level(&self, level: Level) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.level == level)
            .collect()
    }

    pub fn with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.message == message)
            .collect()
    }
}

struct FieldVisitor<'a>(&'a mut BTreeMap<String, String>);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = BTreeMap::new();
        event.record(&mut FieldVisitor(&mut fields));
        let message = fields.remove("message").unwrap_or_default();

        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message,
            fields,
        });
    }
}

/// Runs `f` with a subscriber that captures every event, returning the
/// captured events alongside `f`'s result.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, CaptureLayer) {
    let layer = CaptureLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, layer)
}
