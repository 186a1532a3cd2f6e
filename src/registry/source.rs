//! Registration sources.

use super::InterceptorRegistry;
use crate::errors::RegistryClosedError;

/// Something that adds interceptors to a registry during startup.
///
/// Independent components implement this instead of reaching for a shared
/// list; the application passes every source to
/// [`InterceptorRegistry::from_sources`] (or calls `contribute` itself) before
/// building channels and servers. Each source is invoked once.
///
/// Closures work too:
///
/// ```rust
/// use std::sync::Arc;
/// use rpc_intercept::{
///     AttachHeadersInterceptor, ClientInterceptorRegistry, Metadata, RegistryClosedError,
/// };
///
/// let tenant = |registry: &ClientInterceptorRegistry| -> Result<(), RegistryClosedError> {
///     registry.register(Arc::new(AttachHeadersInterceptor::new(Metadata::new())))?;
///     Ok(())
/// };
///
/// let registry = ClientInterceptorRegistry::from_sources(&[&tenant]).unwrap();
/// assert_eq!(registry.len(), 1);
/// ```
pub trait RegistrationSource<I: ?Sized> {
    fn contribute(&self, registry: &InterceptorRegistry<I>) -> Result<(), RegistryClosedError>;
}

impl<I, F> RegistrationSource<I> for F
where
    I: ?Sized,
    F: Fn(&InterceptorRegistry<I>) -> Result<(), RegistryClosedError>,
{
    fn contribute(&self, registry: &InterceptorRegistry<I>) -> Result<(), RegistryClosedError> {
        self(registry)
    }
}
