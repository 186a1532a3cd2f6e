// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Server-side call contracts.
//!
//! For every inbound call the runtime hands a [`ServerCall`] and the request
//! headers to a [`ServerCallHandler`], which returns the [`ServerListener`]
//! that will receive request messages. The handler answers through the
//! `ServerCall` and ends it with [`ServerCall::close`].

use super::{Metadata, MethodDescriptor, Status};

/// The server's half of one call.
pub trait ServerCall: Send {
    fn method(&self) -> &MethodDescriptor;

    /// Sends response headers. Optional; at most once, before any message.
    fn send_headers(&mut self, headers: Metadata);

    fn send_message(&mut self, message: Vec<u8>);

    /// Ends the call. Consumes the call, so it can only be closed once.
    fn close(self: Box<Self>, status: Status, trailers: Metadata);
}

/// Receives the events of one server call.
///
/// Exactly one of [`on_complete`](ServerListener::on_complete) or
/// [`on_cancel`](ServerListener::on_cancel) ends the listener.
pub trait ServerListener: Send {
    /// A request message arrived.
    fn on_message(&mut self, _message: Vec<u8>) {}

    /// The client will send no more messages.
    fn on_half_close(&mut self) {}

    /// The call can accept more response messages.
    fn on_ready(&mut self) {}

    /// The call was cancelled by the client or the transport.
    fn on_cancel(self: Box<Self>) {}

    /// The call closed normally and its status was handed to the transport.
    fn on_complete(self: Box<Self>) {}
}

/// Starts server calls.
pub trait ServerCallHandler: Send + Sync {
    fn start_call(&self, call: Box<dyn ServerCall>, headers: Metadata) -> Box<dyn ServerListener>;
}

impl<H: ServerCallHandler + ?Sized> ServerCallHandler for std::sync::Arc<H> {
    fn start_call(&self, call: Box<dyn ServerCall>, headers: Metadata) -> Box<dyn ServerListener> {
        (**self).start_call(call, headers)
    }
}
