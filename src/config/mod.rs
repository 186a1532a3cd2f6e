//! Configuration for RPC tracing
//!
//! [`TracingConfig`] controls whether the tracing interceptors are installed,
//! how new traces are sampled, which propagation format is used, and how spans
//! are named. It can be built in code, deserialized as part of a host's own
//! configuration file, or read from the environment.
//!
//! # Example: Using defaults
//!
//! ```rust
//! use rpc_intercept::TracingConfig;
//!
//! // Enabled, every trace sampled, B3 headers
//! let config = TracingConfig::default();
//! assert!(config.enabled);
//! ```
//!
//! # Example: Custom configuration
//!
//! ```rust
//! use rpc_intercept::{Propagation, TracingConfigBuilder};
//!
//! let config = TracingConfigBuilder::new()
//!     .sample_rate(0.25)
//!     .propagation(Propagation::W3c)
//!     .client_span_prefix("call:")
//!     .build();
//! ```
//!
//! # Example: From the environment
//!
//! ```rust,no_run
//! use rpc_intercept::TracingConfig;
//!
//! // Reads RPC_TRACE_* variables, loading a `.env` file if present
//! let config = TracingConfig::from_env()?;
//! # Ok::<(), rpc_intercept::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ConfigError;
use crate::trace::{Propagation, Sampler};

pub mod constants;

pub use constants::{DEFAULT_CLIENT_SPAN_PREFIX, DEFAULT_SERVER_SPAN_PREFIX};

/// Configuration for RPC tracing
///
/// Missing fields take their defaults when deserializing, so a host config
/// file only names what it changes. Use [`TracingConfigBuilder`] for a fluent
/// API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Install the tracing interceptors
    /// Default: true
    pub enabled: bool,

    /// Fraction of new traces recorded. Calls that continue a remote trace
    /// follow the caller's decision.
    /// Default: 1.0
    pub sample_rate: f64,

    /// Header format used to carry trace context
    /// Default: B3
    pub propagation: Propagation,

    /// Default: `"invoke RPC:"`
    pub client_span_prefix: String,

    /// Default: `"handle RPC:"`
    pub server_span_prefix: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: 1.0,
            propagation: Propagation::default(),
            client_span_prefix: DEFAULT_CLIENT_SPAN_PREFIX.to_string(),
            server_span_prefix: DEFAULT_SERVER_SPAN_PREFIX.to_string(),
        }
    }
}

impl TracingConfig {
    /// Defaults with tracing switched off.
    ///
    /// ```rust
    /// use rpc_intercept::TracingConfig;
    ///
    /// assert!(!TracingConfig::disabled().enabled);
    /// ```
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Reads `RPC_TRACE_*` variables on top of the defaults. A `.env` file in
    /// the working directory is loaded first if present. Unset variables
    /// keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a variable is set but does not
    /// parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// ```rust
    /// use std::collections::HashMap;
    /// use rpc_intercept::TracingConfig;
    ///
    /// let vars = HashMap::from([("RPC_TRACE_SAMPLE_RATE", "0.5")]);
    /// let config = TracingConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
    /// assert_eq!(config.sample_rate, 0.5);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(constants::env::ENABLED) {
            config.enabled = parse_bool(constants::env::ENABLED, &raw)?;
        }
        if let Some(raw) = lookup(constants::env::SAMPLE_RATE) {
            config.sample_rate = parse_rate(constants::env::SAMPLE_RATE, &raw)?;
        }
        if let Some(raw) = lookup(constants::env::PROPAGATION) {
            config.propagation = raw.parse().map_err(|_| {
                ConfigError::invalid(
                    constants::env::PROPAGATION,
                    &raw,
                    "expected one of: b3, w3c, tracecontext",
                )
            })?;
        }
        if let Some(prefix) = lookup(constants::env::CLIENT_PREFIX) {
            config.client_span_prefix = prefix;
        }
        if let Some(prefix) = lookup(constants::env::SERVER_PREFIX) {
            config.server_span_prefix = prefix;
        }

        debug!(
            enabled = config.enabled,
            sample_rate = config.sample_rate,
            propagation = %config.propagation,
            "Loaded tracing configuration"
        );
        Ok(config)
    }

    /// The sampler for new traces.
    pub fn sampler(&self) -> Sampler {
        Sampler::ratio(self.sample_rate)
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, raw, "expected true or false")),
    }
}

fn parse_rate(key: &str, raw: &str) -> Result<f64, ConfigError> {
    let rate: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, raw, "expected a number"))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::invalid(key, raw, "must be between 0 and 1"));
    }
    Ok(rate)
}

/// Builder for [`TracingConfig`]
///
/// # Example
///
/// ```rust
/// use rpc_intercept::TracingConfigBuilder;
///
/// let config = TracingConfigBuilder::new()
///     .enabled(false)
///     .server_span_prefix("serve:")
///     .build();
/// assert!(!config.enabled);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TracingConfigBuilder {
    config: TracingConfig,
}

impl TracingConfigBuilder {
    /// Create a new builder starting from [`TracingConfig::default`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration, e.g. one read with
    /// [`TracingConfig::from_env`]
    pub fn from_config(config: TracingConfig) -> Self {
        Self { config }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Values outside `[0, 1]` are clamped.
    pub fn sample_rate(mut self, rate: f64) -> Self {
        self.config.sample_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    pub fn propagation(mut self, propagation: Propagation) -> Self {
        self.config.propagation = propagation;
        self
    }

    pub fn client_span_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.client_span_prefix = prefix.into();
        self
    }

    pub fn server_span_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.server_span_prefix = prefix.into();
        self
    }

    pub fn build(self) -> TracingConfig {
        self.config
    }
}
