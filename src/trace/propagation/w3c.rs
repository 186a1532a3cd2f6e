//! W3C Trace Context propagation.

use super::{SpanExtractor, SpanInjector};
use crate::call::Metadata;
use crate::errors::PropagationError;
use crate::trace::{Span, SpanContext, SpanId, TraceId};

pub const TRACEPARENT_HEADER: &str = "traceparent";

const SAMPLED_FLAG: u8 = 0x01;

/// The `traceparent` header: `00-<trace id>-<parent id>-<flags>`.
///
/// Future versions are accepted as long as their first four fields parse.
/// Version `ff` is invalid, and every field must be lower-case hex.
#[derive(Clone, Copy, Debug, Default)]
pub struct W3cPropagator;

impl SpanInjector for W3cPropagator {
    fn inject(&self, span: &Span, headers: &mut Metadata) -> Result<(), PropagationError> {
        let context = span.context();
        let flags = if context.is_sampled() { SAMPLED_FLAG } else { 0 };
        headers.insert(
            TRACEPARENT_HEADER,
            format!("00-{}-{}-{:02x}", context.trace_id(), context.span_id(), flags),
        )?;
        Ok(())
    }
}

impl SpanExtractor for W3cPropagator {
    fn extract(&self, headers: &Metadata) -> Result<Option<SpanContext>, PropagationError> {
        let Some(raw) = headers.get(TRACEPARENT_HEADER) else {
            return Ok(None);
        };
        parse_traceparent(raw)
            .map(Some)
            .ok_or_else(|| PropagationError::malformed(TRACEPARENT_HEADER, raw))
    }
}

fn parse_traceparent(raw: &str) -> Option<SpanContext> {
    let mut fields = raw.trim().split('-');
    let version_raw = fields.next()?;
    let trace = fields.next()?;
    let span = fields.next()?;
    let flags = fields.next()?;

    if version_raw.len() != 2 || version_raw.eq_ignore_ascii_case("ff") {
        return None;
    }
    let version = u8::from_str_radix(version_raw, 16).ok()?;
    if version == 0 && fields.next().is_some() {
        return None;
    }
    if trace.len() != 32 || flags.len() != 2 {
        return None;
    }
    if [version_raw, trace, span, flags].iter().any(|field| !is_lower_hex(field)) {
        return None;
    }

    let trace_id = TraceId::from_hex(trace)?;
    let span_id = SpanId::from_hex(span)?;
    let flags = u8::from_str_radix(flags, 16).ok()?;

    Some(SpanContext::new(trace_id, span_id, None, flags & SAMPLED_FLAG != 0))
}

fn is_lower_hex(field: &str) -> bool {
    field.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
