// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! In-process transport.
//!
//! [`LoopbackChannel`] connects client calls directly to server handlers in
//! the same process. Everything the interceptors see is real: headers are
//! handed to the server, messages and the final status come back through the
//! client listener. That makes it the transport for tests, demos, and
//! services that call themselves.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rpc_intercept::loopback::{call_unary, unary_handler, LoopbackChannel};
//! use rpc_intercept::{CallOptions, Metadata, MethodDescriptor};
//!
//! let channel = LoopbackChannel::new().with_handler(
//!     "echo.Echo/Say",
//!     unary_handler(|_headers, request| Ok(request)),
//! );
//!
//! let method = MethodDescriptor::unary("echo.Echo/Say");
//! let reply = call_unary(&channel, &method, &CallOptions::new(), Metadata::new(), b"hi".to_vec());
//! assert_eq!(reply.unwrap(), b"hi".to_vec());
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::call::{
    CallOptions, Channel, ClientCall, ClientListener, Metadata, MethodDescriptor, ServerCall,
    ServerCallHandler, ServerListener, Status,
};

/// Routes calls by full method name to in-process handlers.
///
/// Calls to a method with no handler close with `UNIMPLEMENTED`.
#[derive(Clone, Default)]
pub struct LoopbackChannel {
    handlers: HashMap<String, Arc<dyn ServerCallHandler>>,
}

impl LoopbackChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes `method` (e.g. `"pkg.Service/Method"`) to `handler`, replacing
    /// any previous route.
    pub fn with_handler(mut self, method: impl Into<String>, handler: Arc<dyn ServerCallHandler>) -> Self {
        self.handlers.insert(method.into(), handler);
        self
    }

    pub fn has_handler(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }
}

impl Channel for LoopbackChannel {
    fn new_call(&self, method: &MethodDescriptor, _options: &CallOptions) -> Box<dyn ClientCall> {
        Box::new(LoopbackCall {
            method: method.clone(),
            handler: self.handlers.get(method.full_name()).cloned(),
            shared: Arc::new(Mutex::new(Shared::default())),
            server: None,
            started: false,
        })
    }
}

impl fmt::Debug for LoopbackChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("LoopbackChannel").field("methods", &methods).finish()
    }
}

/// State both ends of a call touch.
///
/// Client notifications go through `queue`. Whoever finds the listener in
/// `client` takes it and drains the queue with the lock released, so a
/// listener may call back into its call and concurrent senders never run
/// the listener twice at once.
#[derive(Default)]
struct Shared {
    client: Option<Box<dyn ClientListener>>,
    queue: VecDeque<ClientEvent>,
    closed: bool,
    cancelled: bool,
}

enum ClientEvent {
    Ready,
    Headers(Metadata),
    Message(Vec<u8>),
    Close(Status, Metadata),
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Queues `event` for the client listener and drains the queue if no one
/// else is. Events after the close are dropped; returns whether `event`
/// was accepted.
fn notify_client(shared: &Mutex<Shared>, event: ClientEvent) -> bool {
    let listener = {
        let mut state = lock(shared);
        if state.closed {
            return false;
        }
        state.queue.push_back(event);
        state.client.take()
    };
    if let Some(listener) = listener {
        drain(shared, listener);
    }
    true
}

fn drain(shared: &Mutex<Shared>, mut listener: Box<dyn ClientListener>) {
    loop {
        let event = {
            let mut state = lock(shared);
            match state.queue.pop_front() {
                Some(event) => event,
                None => {
                    state.client = Some(listener);
                    return;
                }
            }
        };
        match event {
            ClientEvent::Ready => listener.on_ready(),
            ClientEvent::Headers(headers) => listener.on_headers(&headers),
            ClientEvent::Message(message) => listener.on_message(message),
            ClientEvent::Close(status, trailers) => {
                listener.on_close(status, trailers);
                return;
            }
        }
    }
}

/// Delivers the final status to the client listener unless the call
/// already closed. Returns whether this call closed it.
fn close_client(shared: &Mutex<Shared>, status: Status, trailers: Metadata, cancelled: bool) -> bool {
    let listener = {
        let mut state = lock(shared);
        if state.closed {
            return false;
        }
        state.closed = true;
        state.cancelled = cancelled;
        state.queue.push_back(ClientEvent::Close(status, trailers));
        state.client.take()
    };
    if let Some(listener) = listener {
        drain(shared, listener);
    }
    true
}

struct LoopbackCall {
    method: MethodDescriptor,
    handler: Option<Arc<dyn ServerCallHandler>>,
    shared: Arc<Mutex<Shared>>,
    server: Option<Box<dyn ServerListener>>,
    started: bool,
}

impl LoopbackCall {
    /// Hands `on_complete` to the server listener once the server has
    /// closed the call normally.
    fn settle(&mut self) {
        let completed = {
            let shared = lock(&self.shared);
            shared.closed && !shared.cancelled
        };
        if completed {
            if let Some(server) = self.server.take() {
                server.on_complete();
            }
        }
    }

    fn with_server(&mut self, f: impl FnOnce(&mut dyn ServerListener)) {
        if let Some(server) = self.server.as_mut() {
            f(server.as_mut());
        }
        self.settle();
    }
}

impl ClientCall for LoopbackCall {
    fn start(&mut self, listener: Box<dyn ClientListener>, headers: Metadata) {
        if self.started {
            debug!(method = %self.method, "Ignoring second start on loopback call");
            return;
        }
        self.started = true;
        lock(&self.shared).client = Some(listener);

        let Some(handler) = self.handler.clone() else {
            debug!(method = %self.method, "No loopback handler for method");
            close_client(
                &self.shared,
                Status::unimplemented(format!("Method not found: {}", self.method)),
                Metadata::new(),
                false,
            );
            return;
        };

        let call = LoopbackServerCall {
            method: self.method.clone(),
            shared: Arc::clone(&self.shared),
        };
        self.server = Some(handler.start_call(Box::new(call), headers));
        self.settle();

        notify_client(&self.shared, ClientEvent::Ready);
    }

    fn send_message(&mut self, message: Vec<u8>) {
        self.with_server(|server| server.on_message(message));
    }

    fn half_close(&mut self) {
        self.with_server(|server| server.on_half_close());
    }

    fn cancel(&mut self, reason: &str) {
        if !close_client(&self.shared, Status::cancelled(reason), Metadata::new(), true) {
            return;
        }
        debug!(method = %self.method, reason, "Loopback call cancelled");
        if let Some(server) = self.server.take() {
            server.on_cancel();
        }
    }
}

impl Drop for LoopbackCall {
    fn drop(&mut self) {
        if self.started && !lock(&self.shared).closed {
            self.cancel("call dropped before completion");
        }
    }
}

struct LoopbackServerCall {
    method: MethodDescriptor,
    shared: Arc<Mutex<Shared>>,
}

impl ServerCall for LoopbackServerCall {
    fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    fn send_headers(&mut self, headers: Metadata) {
        notify_client(&self.shared, ClientEvent::Headers(headers));
    }

    fn send_message(&mut self, message: Vec<u8>) {
        if !notify_client(&self.shared, ClientEvent::Message(message)) {
            debug!(method = %self.method, "Dropping message sent after the call ended");
        }
    }

    fn close(self: Box<Self>, status: Status, trailers: Metadata) {
        if !close_client(&self.shared, status, trailers, false) {
            debug!(method = %self.method, "Ignoring close of a call that already ended");
        }
    }
}

/// Adapts a request-to-response function into a unary handler.
///
/// The function sees the request headers and the single request message.
/// `Ok` sends the response and closes with `OK`; `Err` closes with that
/// status and no response. A call that half-closes without a request
/// closes with `INTERNAL`.
pub fn unary_handler<F>(f: F) -> Arc<dyn ServerCallHandler>
where
    F: Fn(&Metadata, Vec<u8>) -> Result<Vec<u8>, Status> + Send + Sync + 'static,
{
    Arc::new(UnaryHandler { f: Arc::new(f) })
}

struct UnaryHandler<F> {
    f: Arc<F>,
}

impl<F> ServerCallHandler for UnaryHandler<F>
where
    F: Fn(&Metadata, Vec<u8>) -> Result<Vec<u8>, Status> + Send + Sync + 'static,
{
    fn start_call(&self, call: Box<dyn ServerCall>, headers: Metadata) -> Box<dyn ServerListener> {
        Box::new(UnaryListener {
            call: Some(call),
            headers,
            request: None,
            f: Arc::clone(&self.f),
        })
    }
}

struct UnaryListener<F> {
    call: Option<Box<dyn ServerCall>>,
    headers: Metadata,
    request: Option<Vec<u8>>,
    f: Arc<F>,
}

impl<F> ServerListener for UnaryListener<F>
where
    F: Fn(&Metadata, Vec<u8>) -> Result<Vec<u8>, Status> + Send + Sync + 'static,
{
    fn on_message(&mut self, message: Vec<u8>) {
        if self.request.is_some() {
            debug!("Unary call received more than one request; keeping the first");
            return;
        }
        self.request = Some(message);
    }

    fn on_half_close(&mut self) {
        let Some(mut call) = self.call.take() else {
            return;
        };
        let Some(request) = self.request.take() else {
            call.close(Status::internal("Half-closed without a request"), Metadata::new());
            return;
        };

        match (self.f)(&self.headers, request) {
            Ok(response) => {
                call.send_message(response);
                call.close(Status::ok(), Metadata::new());
            }
            Err(status) => call.close(status, Metadata::new()),
        }
    }
}

/// Makes a unary call and waits for its result.
///
/// Returns the response message on `OK`, the status otherwise. A call that
/// closes `OK` without a response yields `INTERNAL`.
pub fn call_unary(
    channel: &dyn Channel,
    method: &MethodDescriptor,
    options: &CallOptions,
    headers: Metadata,
    request: Vec<u8>,
) -> Result<Vec<u8>, Status> {
    let (tx, rx) = mpsc::channel();
    let mut call = channel.new_call(method, options);
    call.start(
        Box::new(UnaryResponse {
            response: None,
            done: tx,
        }),
        headers,
    );
    call.send_message(request);
    call.half_close();

    let (status, response) = rx
        .recv()
        .unwrap_or_else(|_| (Status::internal("Call ended without a status"), None));
    if !status.is_ok() {
        return Err(status);
    }
    response.ok_or_else(|| Status::internal("Call completed without a response"))
}

struct UnaryResponse {
    response: Option<Vec<u8>>,
    done: mpsc::Sender<(Status, Option<Vec<u8>>)>,
}

impl ClientListener for UnaryResponse {
    fn on_message(&mut self, message: Vec<u8>) {
        self.response.get_or_insert(message);
    }

    fn on_close(self: Box<Self>, status: Status, _trailers: Metadata) {
        // The receiver only goes away once call_unary has returned
        let _ = self.done.send((status, self.response));
    }
}
