//! Trace and span identity.

use std::fmt;

use rand::Rng;

/// A 128-bit trace id. Never zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(u128);

impl TraceId {
    /// Returns `None` for the invalid all-zero id.
    pub fn new(value: u128) -> Option<Self> {
        (value != 0).then_some(Self(value))
    }

    /// A random id.
    pub fn random() -> Self {
        Self(rand::thread_rng().gen_range(1..=u128::MAX))
    }

    /// Parses 16 or 32 lowercase or uppercase hex digits. 64-bit ids are
    /// widened with zero high bits.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if !matches!(hex.len(), 16 | 32) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u128::from_str_radix(hex, 16).ok().and_then(Self::new)
    }

    pub fn as_u128(self) -> u128 {
        self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceId({self})")
    }
}

/// A 64-bit span id. Never zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(u64);

impl SpanId {
    pub fn new(value: u64) -> Option<Self> {
        (value != 0).then_some(Self(value))
    }

    pub fn random() -> Self {
        Self(rand::thread_rng().gen_range(1..=u64::MAX))
    }

    /// Parses exactly 16 hex digits.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 16 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u64::from_str_radix(hex, 16).ok().and_then(Self::new)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanId({self})")
    }
}

/// The propagated identity of a span.
///
/// This is what crosses process boundaries in call metadata: enough to make
/// the receiving side's span a child of the sending side's.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpanContext {
    trace_id: TraceId,
    span_id: SpanId,
    parent_id: Option<SpanId>,
    sampled: bool,
}

impl SpanContext {
    pub fn new(trace_id: TraceId, span_id: SpanId, parent_id: Option<SpanId>, sampled: bool) -> Self {
        Self {
            trace_id,
            span_id,
            parent_id,
            sampled,
        }
    }

    /// A new root context with random ids.
    pub fn root(sampled: bool) -> Self {
        Self::new(TraceId::random(), SpanId::random(), None, sampled)
    }

    /// A context for a child span: same trace, new span id, this span as
    /// parent, same sampling decision.
    pub fn child(&self) -> Self {
        Self::new(self.trace_id, SpanId::random(), Some(self.span_id), self.sampled)
    }

    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    pub fn parent_id(&self) -> Option<SpanId> {
        self.parent_id
    }

    pub fn is_sampled(&self) -> bool {
        self.sampled
    }
}
