// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower layers for installing interceptors.
//!
//! Each layer wraps one interceptor around a channel or handler, so
//! interceptors compose with `tower::Layer` the same way any other middleware
//! does.

use std::sync::Arc;

use tower::Layer;

use super::chain::{InterceptedChannel, InterceptedHandler};
use super::{ClientInterceptor, ServerInterceptor};
use crate::call::{Channel, ServerCallHandler};

/// A Tower layer that installs a [`ClientInterceptor`] around a channel.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use rpc_intercept::loopback::LoopbackChannel;
/// use rpc_intercept::{Channel, ClientInterceptorLayer, Propagation, StandardTracer, TraceClientInterceptor};
/// use tower::Layer;
///
/// let tracer = Arc::new(StandardTracer::logging());
/// let layer = ClientInterceptorLayer::new(TraceClientInterceptor::new(tracer, Arc::new(Propagation::B3)));
/// let transport: Arc<dyn Channel> = Arc::new(LoopbackChannel::new());
/// let channel = layer.layer(transport);
/// # let _ = channel;
/// ```
#[derive(Clone)]
pub struct ClientInterceptorLayer {
    interceptor: Arc<dyn ClientInterceptor>,
}

impl ClientInterceptorLayer {
    pub fn new<I>(interceptor: I) -> Self
    where
        I: ClientInterceptor + 'static,
    {
        Self::from_arc(Arc::new(interceptor))
    }

    /// Creates a layer from an interceptor that is already shared.
    pub fn from_arc(interceptor: Arc<dyn ClientInterceptor>) -> Self {
        Self { interceptor }
    }
}

impl Layer<Arc<dyn Channel>> for ClientInterceptorLayer {
    type Service = Arc<dyn Channel>;

    fn layer(&self, inner: Arc<dyn Channel>) -> Self::Service {
        Arc::new(InterceptedChannel::new(inner, Arc::clone(&self.interceptor)))
    }
}

/// A Tower layer that installs a [`ServerInterceptor`] around a handler.
#[derive(Clone)]
pub struct ServerInterceptorLayer {
    interceptor: Arc<dyn ServerInterceptor>,
}

impl ServerInterceptorLayer {
    pub fn new<I>(interceptor: I) -> Self
    where
        I: ServerInterceptor + 'static,
    {
        Self::from_arc(Arc::new(interceptor))
    }

    pub fn from_arc(interceptor: Arc<dyn ServerInterceptor>) -> Self {
        Self { interceptor }
    }
}

impl Layer<Arc<dyn ServerCallHandler>> for ServerInterceptorLayer {
    type Service = Arc<dyn ServerCallHandler>;

    fn layer(&self, inner: Arc<dyn ServerCallHandler>) -> Self::Service {
        Arc::new(InterceptedHandler::new(inner, Arc::clone(&self.interceptor)))
    }
}
