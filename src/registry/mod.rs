// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Interceptor registries.
//!
//! A registry collects interceptors from any number of independent
//! contributors during startup, then seals into the ordered, immutable list a
//! channel or server builder installs.
//!
//! # Lifecycle
//!
//! ```text
//! register(a) ─┐
//! register(b) ─┼─> seal() ──> [a, b, c]  (read-only, shared)
//! register(c) ─┘       └────> register(d) fails with RegistryClosedError
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rpc_intercept::{AttachHeadersInterceptor, ClientInterceptorRegistry, Metadata};
//!
//! let registry = ClientInterceptorRegistry::new();
//! registry
//!     .register(Arc::new(AttachHeadersInterceptor::new(Metadata::new())))
//!     .unwrap();
//!
//! let sealed = registry.seal();
//! assert_eq!(sealed.len(), 1);
//! assert!(registry.is_sealed());
//! ```

mod source;

pub use source::RegistrationSource;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::call::{Channel, ServerCallHandler};
use crate::errors::RegistryClosedError;
use crate::interceptor::{intercept_channel, intercept_handler, ClientInterceptor, ServerInterceptor};

/// Registry of client interceptors.
pub type ClientInterceptorRegistry = InterceptorRegistry<dyn ClientInterceptor>;

/// Registry of server interceptors.
pub type ServerInterceptorRegistry = InterceptorRegistry<dyn ServerInterceptor>;

/// Collects interceptors until sealed.
///
/// # Thread Safety
///
/// Registration and sealing share one mutex. Any `register` call that
/// returned `Ok` happened before the seal and is part of the sealed list; any
/// call after the seal fails. Readers of the sealed list never lock.
pub struct InterceptorRegistry<I: ?Sized> {
    state: Mutex<State<I>>,
}

enum State<I: ?Sized> {
    Open(Vec<Arc<I>>),
    Sealed(Arc<[Arc<I>]>),
}

impl<I: ?Sized> InterceptorRegistry<I> {
    /// Creates an empty, open registry.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Open(Vec::new())),
        }
    }

    /// Creates a registry and lets each source contribute once, in order.
    ///
    /// The returned registry is still open.
    ///
    /// # Errors
    ///
    /// Returns the first error a source reports.
    pub fn from_sources(sources: &[&dyn RegistrationSource<I>]) -> Result<Self, RegistryClosedError> {
        let registry = Self::new();
        for source in sources {
            source.contribute(&registry)?;
        }
        debug!(
            sources = sources.len(),
            interceptors = registry.len(),
            "Collected interceptors from registration sources"
        );
        Ok(registry)
    }

    /// Appends an interceptor. Returns `self` so registrations chain.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryClosedError`] if the registry is sealed. The sealed
    /// list is left unchanged.
    pub fn register(&self, interceptor: Arc<I>) -> Result<&Self, RegistryClosedError> {
        match &mut *self.lock() {
            State::Open(pending) => {
                pending.push(interceptor);
                Ok(self)
            }
            State::Sealed(list) => Err(RegistryClosedError::new(list.len())),
        }
    }

    /// Freezes the registry and returns its interceptors in registration
    /// order. Calling it again returns the same list.
    pub fn seal(&self) -> Arc<[Arc<I>]> {
        let mut state = self.lock();
        let list: Arc<[Arc<I>]> = match &mut *state {
            State::Sealed(list) => return Arc::clone(list),
            State::Open(pending) => Arc::from(std::mem::take(pending)),
        };
        *state = State::Sealed(Arc::clone(&list));

        debug!(interceptors = list.len(), "Sealed interceptor registry");
        list
    }

    /// Returns the sealed list, sealing first if needed.
    pub fn get_all(&self) -> Arc<[Arc<I>]> {
        self.seal()
    }

    pub fn is_sealed(&self) -> bool {
        matches!(&*self.lock(), State::Sealed(_))
    }

    pub fn len(&self) -> usize {
        match &*self.lock() {
            State::Open(pending) => pending.len(),
            State::Sealed(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, State<I>> {
        // A panic while holding the lock cannot leave `State` half-updated
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<I: ?Sized> Default for InterceptorRegistry<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ?Sized> fmt::Debug for InterceptorRegistry<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorRegistry")
            .field("interceptors", &self.len())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

impl InterceptorRegistry<dyn ClientInterceptor> {
    /// Seals the registry and installs its interceptors around `channel`.
    pub fn apply(&self, channel: Arc<dyn Channel>) -> Arc<dyn Channel> {
        intercept_channel(channel, &self.get_all())
    }
}

impl InterceptorRegistry<dyn ServerInterceptor> {
    /// Seals the registry and installs its interceptors around `handler`.
    pub fn apply(&self, handler: Arc<dyn ServerCallHandler>) -> Arc<dyn ServerCallHandler> {
        intercept_handler(handler, &self.get_all())
    }
}
