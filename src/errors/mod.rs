//! Error types for the rpc-intercept library.
//!
//! Errors follow a hybrid approach:
//!
//! - **Module-specific errors** for fine-grained handling ([`RegistryClosedError`],
//!   [`MetadataError`], [`PropagationError`], [`ConfigError`])
//! - **Unified error type** ([`Error`]) for convenience when you don't need
//!   to distinguish between error sources
//!
//! None of these ever reach an RPC caller as a call failure. Tracing and
//! registry problems are logged at the interceptor boundary; only the RPC
//! runtime's own failures surface as a non-OK [`Status`](crate::Status).
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use rpc_intercept::{ClientInterceptorRegistry, Error, Metadata, AttachHeadersInterceptor};
//!
//! fn wire(registry: &ClientInterceptorRegistry) -> Result<(), Error> {
//!     let mut headers = Metadata::new();
//!     headers.insert("x-tenant", "acme")?;
//!     registry.register(Arc::new(AttachHeadersInterceptor::new(headers)))?;
//!     Ok(())
//! }
//!
//! let registry = ClientInterceptorRegistry::new();
//! wire(&registry).unwrap();
//! registry.seal();
//! assert!(matches!(wire(&registry), Err(Error::RegistryClosed(_))));
//! ```

mod config;
mod metadata;
mod propagation;
mod registry;

pub use config::ConfigError;
pub use metadata::MetadataError;
pub use propagation::PropagationError;
pub use registry::RegistryClosedError;

/// Unified error type for all rpc-intercept operations.
///
/// All module-specific error types convert to `Error` via `From`, so `?`
/// propagates them naturally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Registration was attempted on a sealed registry.
    #[error("Registry error: {0}")]
    RegistryClosed(#[from] RegistryClosedError),

    /// A metadata key or value was rejected.
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Trace context could not be injected or extracted.
    #[error("Propagation error: {0}")]
    Propagation(#[from] PropagationError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
