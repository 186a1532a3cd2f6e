//! Installing the tracing interceptors from configuration.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{LoggingReporter, Reporter, StandardTracer, TraceClientInterceptor, TraceServerInterceptor, Tracer};
use crate::config::TracingConfig;
use crate::errors::RegistryClosedError;
use crate::interceptor::{ClientInterceptor, ServerInterceptor};
use crate::registry::{InterceptorRegistry, RegistrationSource};

/// A [`RegistrationSource`] for both registries that adds the tracing
/// interceptors when [`TracingConfig::enabled`] is set, and nothing otherwise.
///
/// Both interceptors share one tracer.
///
/// ```rust
/// use rpc_intercept::{
///     ClientInterceptorRegistry, ServerInterceptorRegistry, TracingConfig, TracingConfigurer,
/// };
///
/// let tracing = TracingConfigurer::from_config(TracingConfig::default());
/// let client = ClientInterceptorRegistry::from_sources(&[&tracing]).unwrap();
/// let server = ServerInterceptorRegistry::from_sources(&[&tracing]).unwrap();
/// assert_eq!((client.len(), server.len()), (1, 1));
///
/// let off = TracingConfigurer::from_config(TracingConfig::disabled());
/// assert!(ClientInterceptorRegistry::from_sources(&[&off]).unwrap().is_empty());
/// ```
#[derive(Clone)]
pub struct TracingConfigurer {
    config: TracingConfig,
    tracer: Arc<dyn Tracer>,
}

impl TracingConfigurer {
    pub fn new(config: TracingConfig, tracer: Arc<dyn Tracer>) -> Self {
        Self { config, tracer }
    }

    /// Uses a [`StandardTracer`] sampling at the configured rate and
    /// logging spans through [`LoggingReporter`].
    pub fn from_config(config: TracingConfig) -> Self {
        Self::with_reporter(config, Arc::new(LoggingReporter))
    }

    /// Uses a [`StandardTracer`] sampling at the configured rate and
    /// reporting to `reporter`.
    pub fn with_reporter(config: TracingConfig, reporter: Arc<dyn Reporter>) -> Self {
        let tracer = StandardTracer::new(reporter).with_sampler(config.sampler());
        Self::new(config, Arc::new(tracer))
    }

    pub fn config(&self) -> &TracingConfig {
        &self.config
    }

    pub fn tracer(&self) -> &Arc<dyn Tracer> {
        &self.tracer
    }

    pub fn client_interceptor(&self) -> TraceClientInterceptor {
        TraceClientInterceptor::new(Arc::clone(&self.tracer), Arc::new(self.config.propagation))
            .with_span_prefix(self.config.client_span_prefix.as_str())
    }

    pub fn server_interceptor(&self) -> TraceServerInterceptor {
        TraceServerInterceptor::new(Arc::clone(&self.tracer), Arc::new(self.config.propagation))
            .with_span_prefix(self.config.server_span_prefix.as_str())
    }
}

impl RegistrationSource<dyn ClientInterceptor> for TracingConfigurer {
    fn contribute(&self, registry: &InterceptorRegistry<dyn ClientInterceptor>) -> Result<(), RegistryClosedError> {
        if !self.config.enabled {
            debug!("Tracing disabled; no client tracing interceptor registered");
            return Ok(());
        }
        registry.register(Arc::new(self.client_interceptor()))?;
        debug!(propagation = %self.config.propagation, "Registered client tracing interceptor");
        Ok(())
    }
}

impl RegistrationSource<dyn ServerInterceptor> for TracingConfigurer {
    fn contribute(&self, registry: &InterceptorRegistry<dyn ServerInterceptor>) -> Result<(), RegistryClosedError> {
        if !self.config.enabled {
            debug!("Tracing disabled; no server tracing interceptor registered");
            return Ok(());
        }
        registry.register(Arc::new(self.server_interceptor()))?;
        debug!(propagation = %self.config.propagation, "Registered server tracing interceptor");
        Ok(())
    }
}

impl fmt::Debug for TracingConfigurer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingConfigurer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
