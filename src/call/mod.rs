//! The call model interceptors operate on.
//!
//! These traits are the extension point an RPC runtime exposes: a client
//! [`Channel`] that creates [`ClientCall`]s, and a [`ServerCallHandler`] that
//! starts [`ServerCall`]s. Transports, codecs and connection management live
//! behind them and are not part of this crate.

mod client;
mod metadata;
mod method;
mod server;
mod status;

pub use client::{Channel, ClientCall, ClientListener};
pub use metadata::Metadata;
pub use method::{CallOptions, MethodDescriptor, MethodType};
pub use server::{ServerCall, ServerCallHandler, ServerListener};
pub use status::{Code, Status};
