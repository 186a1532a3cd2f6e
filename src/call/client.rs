// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Client-side call contracts.
//!
//! A [`Channel`] creates [`ClientCall`]s. The caller starts a call with a
//! [`ClientListener`] and the outgoing headers; the runtime reports progress
//! through the listener and ends the call with exactly one
//! [`ClientListener::on_close`].
//!
//! ```text
//! channel.new_call(method, options)  -> Box<dyn ClientCall>
//! call.start(listener, headers)      -> listener.on_ready() ...
//! call.send_message(..) / half_close -> listener.on_message(..) ...
//!                                    -> listener.on_close(status, trailers)
//! ```

use super::{CallOptions, Metadata, MethodDescriptor, Status};

/// Receives the events of one client call.
///
/// Every hook except [`on_close`](ClientListener::on_close) has a no-op
/// default. `on_close` consumes the listener, so a listener can only observe
/// one terminal event.
pub trait ClientListener: Send {
    /// Response headers arrived.
    fn on_headers(&mut self, _headers: &Metadata) {}

    /// A response message arrived.
    fn on_message(&mut self, _message: Vec<u8>) {}

    /// The call is ready to send messages without excessive buffering.
    fn on_ready(&mut self) {}

    /// The call finished. Delivered exactly once, including for failures and
    /// cancellation.
    fn on_close(self: Box<Self>, status: Status, trailers: Metadata);
}

/// One outgoing call.
pub trait ClientCall: Send {
    /// Starts the call. Must be called exactly once, before any other method.
    fn start(&mut self, listener: Box<dyn ClientListener>, headers: Metadata);

    fn send_message(&mut self, message: Vec<u8>);

    /// No more messages will be sent.
    fn half_close(&mut self);

    /// Aborts the call. The listener still receives `on_close`, with
    /// [`Code::Cancelled`](super::Code::Cancelled).
    fn cancel(&mut self, reason: &str);
}

/// Creates client calls.
///
/// Interceptors are installed by wrapping a channel; see
/// [`intercept_channel`](crate::intercept_channel).
pub trait Channel: Send + Sync {
    fn new_call(&self, method: &MethodDescriptor, options: &CallOptions) -> Box<dyn ClientCall>;
}

impl<C: Channel + ?Sized> Channel for std::sync::Arc<C> {
    fn new_call(&self, method: &MethodDescriptor, options: &CallOptions) -> Box<dyn ClientCall> {
        (**self).new_call(method, options)
    }
}
