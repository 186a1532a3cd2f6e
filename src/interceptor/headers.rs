//! Static header attachment.

use super::ClientInterceptor;
use crate::call::{CallOptions, Channel, ClientCall, ClientListener, Metadata, MethodDescriptor};

/// Adds a fixed set of headers to every outgoing call.
///
/// Entries are appended, so headers already set by the caller or by an outer
/// interceptor are kept.
///
/// ```rust
/// use rpc_intercept::{AttachHeadersInterceptor, Metadata};
///
/// let mut headers = Metadata::new();
/// headers.insert("x-tenant", "acme").unwrap();
/// let interceptor = AttachHeadersInterceptor::new(headers);
/// ```
#[derive(Clone, Debug)]
pub struct AttachHeadersInterceptor {
    headers: Metadata,
}

impl AttachHeadersInterceptor {
    pub fn new(headers: Metadata) -> Self {
        Self { headers }
    }
}

impl ClientInterceptor for AttachHeadersInterceptor {
    fn intercept_call(
        &self,
        method: &MethodDescriptor,
        options: &CallOptions,
        next: &dyn Channel,
    ) -> Box<dyn ClientCall> {
        Box::new(AttachHeadersCall {
            delegate: next.new_call(method, options),
            extra: self.headers.clone(),
        })
    }
}

struct AttachHeadersCall {
    delegate: Box<dyn ClientCall>,
    extra: Metadata,
}

impl ClientCall for AttachHeadersCall {
    fn start(&mut self, listener: Box<dyn ClientListener>, mut headers: Metadata) {
        headers.merge(&self.extra);
        self.delegate.start(listener, headers);
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
