//! Method descriptors and per-call options.

use std::fmt;
use std::time::Duration;

use crate::trace::SpanContext;

/// The streaming shape of a method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MethodType {
    Unary,
    ClientStreaming,
    ServerStreaming,
    BidiStreaming,
}

/// Identifies the method a call invokes.
///
/// The full name has the form `package.Service/Method`.
///
/// ```rust
/// use rpc_intercept::MethodDescriptor;
///
/// let method = MethodDescriptor::unary("helloworld.Greeter/SayHello");
/// assert_eq!(method.service_name(), Some("helloworld.Greeter"));
/// assert_eq!(method.method_name(), Some("SayHello"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    full_name: String,
    method_type: MethodType,
}

impl MethodDescriptor {
    pub fn new(full_name: impl Into<String>, method_type: MethodType) -> Self {
        Self {
            full_name: full_name.into(),
            method_type,
        }
    }

    /// Shorthand for a unary method.
    pub fn unary(full_name: impl Into<String>) -> Self {
        Self::new(full_name, MethodType::Unary)
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn method_type(&self) -> MethodType {
        self.method_type
    }

    /// The part before the last `/`, if any.
    pub fn service_name(&self) -> Option<&str> {
        self.full_name.rsplit_once('/').map(|(service, _)| service)
    }

    /// The part after the last `/`, if any.
    pub fn method_name(&self) -> Option<&str> {
        self.full_name.rsplit_once('/').map(|(_, method)| method)
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// Options attached to a single outgoing call.
///
/// The parent span context, when set, makes the client tracing interceptor
/// create the call's span as a child instead of starting a new trace.
#[derive(Clone, Debug, Default)]
pub struct CallOptions {
    deadline: Option<Duration>,
    authority: Option<String>,
    parent: Option<SpanContext>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = Some(authority.into());
        self
    }

    /// Continue the trace described by `parent`.
    #[must_use]
    pub fn with_parent(mut self, parent: SpanContext) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    pub fn parent(&self) -> Option<&SpanContext> {
        self.parent.as_ref()
    }
}
