// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Chain composition.
//!
//! Each interceptor is installed by wrapping the channel (or handler) built so
//! far. Wrapping happens from the last interceptor to the first, which leaves
//! the first one outermost.

use std::fmt;
use std::sync::Arc;

use tower::Layer;
use tracing::debug;

use super::{ClientInterceptor, ClientInterceptorLayer, ServerInterceptor, ServerInterceptorLayer};
use crate::call::{
    CallOptions, Channel, ClientCall, Metadata, MethodDescriptor, ServerCall, ServerCallHandler,
    ServerListener,
};
use crate::spans;

/// A channel whose calls pass through one interceptor before reaching `next`.
#[derive(Clone)]
pub struct InterceptedChannel {
    next: Arc<dyn Channel>,
    interceptor: Arc<dyn ClientInterceptor>,
}

impl InterceptedChannel {
    pub fn new(next: Arc<dyn Channel>, interceptor: Arc<dyn ClientInterceptor>) -> Self {
        Self { next, interceptor }
    }
}

impl fmt::Debug for InterceptedChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptedChannel").finish_non_exhaustive()
    }
}

impl Channel for InterceptedChannel {
    fn new_call(&self, method: &MethodDescriptor, options: &CallOptions) -> Box<dyn ClientCall> {
        self.interceptor
            .intercept_call(method, options, self.next.as_ref())
    }
}

/// A handler whose calls pass through one interceptor before reaching `next`.
#[derive(Clone)]
pub struct InterceptedHandler {
    next: Arc<dyn ServerCallHandler>,
    interceptor: Arc<dyn ServerInterceptor>,
}

impl InterceptedHandler {
    pub fn new(next: Arc<dyn ServerCallHandler>, interceptor: Arc<dyn ServerInterceptor>) -> Self {
        Self { next, interceptor }
    }
}

impl fmt::Debug for InterceptedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptedHandler").finish_non_exhaustive()
    }
}

impl ServerCallHandler for InterceptedHandler {
    fn start_call(&self, call: Box<dyn ServerCall>, headers: Metadata) -> Box<dyn ServerListener> {
        self.interceptor
            .intercept_call(call, headers, self.next.as_ref())
    }
}

/// Installs `interceptors` around `channel`.
///
/// `interceptors[0]` ends up outermost: it observes call start first and call
/// close last.
pub fn intercept_channel(
    channel: Arc<dyn Channel>,
    interceptors: &[Arc<dyn ClientInterceptor>],
) -> Arc<dyn Channel> {
    let _guard = spans::build_chain("client", interceptors.len()).entered();

    let channel = interceptors.iter().rev().fold(channel, |inner, interceptor| {
        ClientInterceptorLayer::from_arc(Arc::clone(interceptor)).layer(inner)
    });

    debug!(interceptors = interceptors.len(), "Installed client interceptor chain");
    channel
}

/// Installs `interceptors` around `handler`.
///
/// `interceptors[0]` ends up outermost.
pub fn intercept_handler(
    handler: Arc<dyn ServerCallHandler>,
    interceptors: &[Arc<dyn ServerInterceptor>],
) -> Arc<dyn ServerCallHandler> {
    let _guard = spans::build_chain("server", interceptors.len()).entered();

    let handler = interceptors.iter().rev().fold(handler, |inner, interceptor| {
        ServerInterceptorLayer::from_arc(Arc::clone(interceptor)).layer(inner)
    });

    debug!(interceptors = interceptors.len(), "Installed server interceptor chain");
    handler
}
