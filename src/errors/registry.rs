//! Error raised when an interceptor registry no longer accepts registrations.

/// Registration was attempted after the registry was sealed.
///
/// Sealing freezes the interceptor list that channel and server builders
/// install, so late registrations are rejected rather than silently dropped.
/// Every attempt after the seal fails the same way and leaves the sealed list
/// untouched.
///
/// # Examples
///
/// ```rust
/// use rpc_intercept::RegistryClosedError;
///
/// let error = RegistryClosedError::new(3);
/// assert_eq!(error.sealed_len(), 3);
/// println!("Error: {}", error);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Interceptor registry is sealed with {sealed_len} interceptor(s); registration rejected")]
pub struct RegistryClosedError {
    sealed_len: usize,
}

impl RegistryClosedError {
    /// Creates an error for a registry sealed with `sealed_len` interceptors.
    pub fn new(sealed_len: usize) -> Self {
        Self { sealed_len }
    }

    /// Number of interceptors in the sealed list.
    pub fn sealed_len(&self) -> usize {
        self.sealed_len
    }
}
