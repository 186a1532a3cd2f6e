//! Carrying span context across process boundaries in call metadata.
//!
//! Two wire formats are bundled:
//!
//! | Format | Headers |
//! |--------|---------|
//! | [`B3Propagator`] | `x-b3-traceid`, `x-b3-spanid`, `x-b3-parentspanid`, `x-b3-sampled`, `x-span-name` |
//! | [`W3cPropagator`] | `traceparent` |
//!
//! [`Propagation`] selects one of them from configuration.

mod b3;
mod w3c;

pub use b3::B3Propagator;
pub use w3c::W3cPropagator;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Span, SpanContext};
use crate::call::Metadata;
use crate::errors::{ConfigError, PropagationError};

/// Writes a span's context into outgoing metadata.
pub trait SpanInjector: Send + Sync {
    fn inject(&self, span: &Span, headers: &mut Metadata) -> Result<(), PropagationError>;
}

/// Reads the caller's span context from incoming metadata.
pub trait SpanExtractor: Send + Sync {
    /// Returns `Ok(None)` when the metadata carries no trace context.
    fn extract(&self, headers: &Metadata) -> Result<Option<SpanContext>, PropagationError>;
}

/// A configurable choice of bundled propagation format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Propagation {
    #[default]
    B3,
    W3c,
}

impl SpanInjector for Propagation {
    fn inject(&self, span: &Span, headers: &mut Metadata) -> Result<(), PropagationError> {
        match self {
            Self::B3 => B3Propagator.inject(span, headers),
            Self::W3c => W3cPropagator.inject(span, headers),
        }
    }
}

impl SpanExtractor for Propagation {
    fn extract(&self, headers: &Metadata) -> Result<Option<SpanContext>, PropagationError> {
        match self {
            Self::B3 => B3Propagator.extract(headers),
            Self::W3c => W3cPropagator.extract(headers),
        }
    }
}

impl FromStr for Propagation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "b3" => Ok(Self::B3),
            "w3c" | "tracecontext" => Ok(Self::W3c),
            _ => Err(ConfigError::invalid(
                "propagation",
                s,
                "expected one of: b3, w3c, tracecontext",
            )),
        }
    }
}

impl fmt::Display for Propagation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::B3 => f.write_str("b3"),
            Self::W3c => f.write_str("w3c"),
        }
    }
}
