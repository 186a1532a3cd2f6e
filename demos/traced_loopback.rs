/// Traced calls over the in-process transport
///
/// This example demonstrates:
/// 1. Collecting client and server interceptors from registration sources
/// 2. Auto-wiring the tracing interceptors from configuration
/// 3. Making calls whose client and server spans share one trace
/// 4. How failing calls are logged without changing their outcome
///
/// Run with:
/// ```bash
/// cargo run --example traced_loopback
/// ```
///
/// Configuration comes from `RPC_TRACE_*` environment variables (or a `.env`
/// file); for example `RPC_TRACE_PROPAGATION=w3c` switches to `traceparent`
/// headers. Set `RUST_LOG=rpc_intercept=debug` to see span lifecycle events.
use std::sync::Arc;

use anyhow::{Context, Result};
use rpc_intercept::loopback::{call_unary, unary_handler, LoopbackChannel};
use rpc_intercept::{
    AttachHeadersInterceptor, CallOptions, ClientInterceptorRegistry, Code, InMemoryReporter,
    Metadata, MethodDescriptor, RegistryClosedError, ServerInterceptorRegistry, Status,
    TracingConfig, TracingConfigurer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const GREET: &str = "demo.Greeter/Greet";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = TracingConfig::from_env().context("Invalid RPC_TRACE_* configuration")?;
    info!(?config, "Loaded tracing configuration");

    // Spans are kept in memory so the demo can print them at the end
    let reporter = InMemoryReporter::new();
    let tracing = TracingConfigurer::with_reporter(config, Arc::new(reporter.clone()));

    // Server side: tracing only
    let server = ServerInterceptorRegistry::from_sources(&[&tracing])?;
    let greeter = server.apply(unary_handler(|headers, request| {
        let name = String::from_utf8(request)
            .map_err(|_| Status::new(Code::InvalidArgument, "name must be UTF-8"))?;
        if name.is_empty() {
            return Err(Status::new(Code::InvalidArgument, "name must not be empty"));
        }
        let tenant = headers.get("x-tenant").unwrap_or("nobody");
        Ok(format!("Hello, {name} (tenant {tenant})").into_bytes())
    }));
    let transport = LoopbackChannel::new().with_handler(GREET, greeter);

    // Client side: a static tenant header, then tracing
    let mut tenant_headers = Metadata::new();
    tenant_headers.insert("x-tenant", "acme")?;
    let tenant = move |registry: &ClientInterceptorRegistry| -> Result<(), RegistryClosedError> {
        registry.register(Arc::new(AttachHeadersInterceptor::new(tenant_headers.clone())))?;
        Ok(())
    };
    let client = ClientInterceptorRegistry::from_sources(&[&tenant, &tracing])?;
    let channel = client.apply(Arc::new(transport));

    let method = MethodDescriptor::unary(GREET);
    for name in ["Ada", ""] {
        match call_unary(
            &*channel,
            &method,
            &CallOptions::new(),
            Metadata::new(),
            name.as_bytes().to_vec(),
        ) {
            Ok(reply) => info!(reply = %String::from_utf8_lossy(&reply), "Call succeeded"),
            Err(status) => warn!(%status, "Call failed"),
        }
    }

    for span in reporter.spans() {
        println!("{}", serde_json::to_string_pretty(&span)?);
    }

    Ok(())
}
