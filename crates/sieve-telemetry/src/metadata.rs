use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource as semconv;
use sieve_config::TelemetryConfig;

const PROCESS_PID: &str = "process.pid";

/// Resource describing this proxy process
///
/// Configured attributes are merged last and win over the defaults.
pub fn build_resource(config: &TelemetryConfig) -> Resource {
    let defaults = [
        KeyValue::new(semconv::SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new(PROCESS_PID, i64::from(std::process::id())),
    ];

    let configured = config
        .resource_attributes
        .iter()
        .map(|(key, value)| KeyValue::new(key.clone(), value.clone()));

    Resource::builder_empty()
        .with_service_name(config.service_name.clone())
        .with_attributes(defaults)
        .with_attributes(configured)
        .build()
}
