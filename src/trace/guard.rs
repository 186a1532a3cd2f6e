//! Exactly-once span release.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::{Span, Tracer};
use crate::call::Status;

pub(crate) const STATUS_CODE_TAG: &str = "rpc.status_code";
pub(crate) const STATUS_DESCRIPTION_TAG: &str = "rpc.status_description";

/// Where a traced call is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CallState {
    Created,
    Sent,
    Closed,
}

/// Owns a call's span until it is released.
///
/// The first release closes the span through the tracer; later releases are
/// no-ops. A guard dropped while still holding its span releases it, so a
/// call that ends without a terminal notification still closes its span.
pub(crate) struct SpanGuard {
    span: Option<Span>,
    tracer: Arc<dyn Tracer>,
    state: CallState,
}

impl SpanGuard {
    pub(crate) fn new(span: Span, tracer: Arc<dyn Tracer>) -> Self {
        Self {
            span: Some(span),
            tracer,
            state: CallState::Created,
        }
    }

    pub(crate) fn state(&self) -> CallState {
        self.state
    }

    pub(crate) fn log_event(&mut self, event: &str) {
        if let Some(span) = self.span.as_mut() {
            span.log_event(event);
        }
    }

    pub(crate) fn tag(&mut self, key: &str, value: &str) {
        if let Some(span) = self.span.as_mut() {
            span.tag(key, value);
        }
    }

    /// Moves `Created` to `Sent`, logging `event`. Returns whether the
    /// transition happened.
    pub(crate) fn mark_sent(&mut self, event: &str) -> bool {
        if self.state != CallState::Created {
            return false;
        }
        self.state = CallState::Sent;
        self.log_event(event);
        true
    }

    /// Tags the span with the call's outcome and logs it: `DEBUG` for OK,
    /// `WARN` with the code and description otherwise.
    pub(crate) fn record_status(&mut self, status: &Status, method: &str) {
        let Some(span) = self.span.as_mut() else {
            return;
        };
        span.tag(STATUS_CODE_TAG, status.code().as_str());
        if let Some(description) = status.description() {
            span.tag(STATUS_DESCRIPTION_TAG, description);
        }

        let _entered = span.tracing_span().enter();
        if status.is_ok() {
            debug!(method, "Call finished successfully");
        } else {
            warn!(
                method,
                code = %status.code(),
                description = status.description().unwrap_or_default(),
                "Call finished with non-OK status"
            );
        }
    }

    /// Closes the span if it is still open. Returns whether this call closed it.
    pub(crate) fn release(&mut self) -> bool {
        self.state = CallState::Closed;
        match self.span.take() {
            Some(span) => {
                self.tracer.close(span);
                true
            }
            None => false,
        }
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        if self.span.is_some() {
            debug!(state = ?self.state, "Call ended without a terminal event; releasing its span");
            self.release();
        }
    }
}

/// A guard shared between a call and its listener.
pub(crate) type SharedSpanGuard = Arc<Mutex<SpanGuard>>;

pub(crate) fn lock(guard: &SharedSpanGuard) -> MutexGuard<'_, SpanGuard> {
    guard.lock().unwrap_or_else(PoisonError::into_inner)
}
