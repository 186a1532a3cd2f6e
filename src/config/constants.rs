//! Well-known names and defaults
//!
//! This module centralizes the environment variable names and default span
//! prefixes used by the tracing configuration.

/// Default prefix for client span names (`"invoke RPC:" + method`)
pub const DEFAULT_CLIENT_SPAN_PREFIX: &str = "invoke RPC:";

/// Default prefix for server span names (`"handle RPC:" + method`)
pub const DEFAULT_SERVER_SPAN_PREFIX: &str = "handle RPC:";

/// Environment variables read by [`TracingConfig::from_env`](super::TracingConfig::from_env)
pub mod env {
    /// `true`/`false` (also `1`/`0`, `yes`/`no`, `on`/`off`)
    pub const ENABLED: &str = "RPC_TRACE_ENABLED";

    /// Fraction of new traces to record, between 0 and 1
    pub const SAMPLE_RATE: &str = "RPC_TRACE_SAMPLE_RATE";

    /// `b3`, `w3c`, or `tracecontext`
    pub const PROPAGATION: &str = "RPC_TRACE_PROPAGATION";

    pub const CLIENT_PREFIX: &str = "RPC_TRACE_CLIENT_PREFIX";

    pub const SERVER_PREFIX: &str = "RPC_TRACE_SERVER_PREFIX";

    /// Every variable, in the order they are read
    pub const ALL: [&str; 5] = [ENABLED, SAMPLE_RATE, PROPAGATION, CLIENT_PREFIX, SERVER_PREFIX];
}
