//! B3 multi-header propagation.

use super::{SpanExtractor, SpanInjector};
use crate::call::Metadata;
use crate::errors::PropagationError;
use crate::trace::{Span, SpanContext, SpanId, TraceId};

pub const TRACE_ID_HEADER: &str = "x-b3-traceid";
pub const SPAN_ID_HEADER: &str = "x-b3-spanid";
pub const PARENT_SPAN_ID_HEADER: &str = "x-b3-parentspanid";
pub const SAMPLED_HEADER: &str = "x-b3-sampled";
pub const SPAN_NAME_HEADER: &str = "x-span-name";

/// B3 multi-header format, plus the span name in `x-span-name`.
///
/// Extraction accepts 64-bit and 128-bit trace ids. A missing
/// `x-b3-sampled` header means sampled.
#[derive(Clone, Copy, Debug, Default)]
pub struct B3Propagator;

impl SpanInjector for B3Propagator {
    /// Writes all B3 headers or none: on error `headers` is left untouched.
    fn inject(&self, span: &Span, headers: &mut Metadata) -> Result<(), PropagationError> {
        let context = span.context();
        let mut b3 = Metadata::new();
        b3.insert(TRACE_ID_HEADER, context.trace_id().to_string())?;
        b3.insert(SPAN_ID_HEADER, context.span_id().to_string())?;
        if let Some(parent) = context.parent_id() {
            b3.insert(PARENT_SPAN_ID_HEADER, parent.to_string())?;
        }
        b3.insert(SAMPLED_HEADER, if context.is_sampled() { "1" } else { "0" })?;
        b3.insert(SPAN_NAME_HEADER, span.name())?;

        for key in [TRACE_ID_HEADER, SPAN_ID_HEADER, PARENT_SPAN_ID_HEADER, SAMPLED_HEADER, SPAN_NAME_HEADER] {
            headers.remove(key);
        }
        headers.merge(&b3);
        Ok(())
    }
}

impl SpanExtractor for B3Propagator {
    fn extract(&self, headers: &Metadata) -> Result<Option<SpanContext>, PropagationError> {
        let Some(raw_trace) = headers.get(TRACE_ID_HEADER) else {
            return Ok(None);
        };
        let trace_id = TraceId::from_hex(raw_trace)
            .ok_or_else(|| PropagationError::malformed(TRACE_ID_HEADER, raw_trace))?;

        let raw_span = headers.get(SPAN_ID_HEADER).unwrap_or_default();
        let span_id = SpanId::from_hex(raw_span)
            .ok_or_else(|| PropagationError::malformed(SPAN_ID_HEADER, raw_span))?;

        let parent_id = headers
            .get(PARENT_SPAN_ID_HEADER)
            .map(|raw| {
                SpanId::from_hex(raw)
                    .ok_or_else(|| PropagationError::malformed(PARENT_SPAN_ID_HEADER, raw))
            })
            .transpose()?;

        let sampled = match headers.get(SAMPLED_HEADER) {
            None | Some("1") | Some("d") => true,
            Some(raw) if raw.eq_ignore_ascii_case("true") => true,
            Some("0") => false,
            Some(raw) if raw.eq_ignore_ascii_case("false") => false,
            Some(raw) => return Err(PropagationError::malformed(SAMPLED_HEADER, raw)),
        };

        Ok(Some(SpanContext::new(trace_id, span_id, parent_id, sampled)))
    }
}
