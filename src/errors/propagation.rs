//! Errors raised while injecting or extracting trace context.
//!
//! Propagation is best-effort: the tracing interceptors catch these at the
//! call boundary and log them. A call never fails because its trace context
//! could not be carried.

use super::MetadataError;

/// Errors that can occur while moving a span context in or out of metadata.
#[derive(Debug, thiserror::Error)]
pub enum PropagationError {
    /// A propagation header could not be written.
    #[error("Failed to write propagation header: {0}")]
    Metadata(#[from] MetadataError),

    /// A propagation header was present but could not be parsed.
    #[error("Malformed {header} header: {value:?}")]
    Malformed {
        /// Header name
        header: &'static str,
        /// The raw header value
        value: String,
    },

    /// The tracer or a custom propagator failed.
    #[error("Tracer failure during {operation}")]
    Tracer {
        /// What was being attempted (e.g., "inject", "extract")
        operation: String,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PropagationError {
    /// Helper to create a `Malformed` error.
    pub fn malformed(header: &'static str, value: impl Into<String>) -> Self {
        PropagationError::Malformed {
            header,
            value: value.into(),
        }
    }

    /// Helper to create a `Tracer` error from any error type.
    pub fn tracer(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PropagationError::Tracer {
            operation: operation.into(),
            source: Box::new(source),
        }
    }
}
