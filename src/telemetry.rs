use crate::config::ObservabilityConfig;
use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize structured logging for the orchestration core.
///
/// JSON output with span context gives each delegation a traceable record,
/// keyed by the correlation ids attached to delegation spans. A disabled
/// `tracing_enabled` skips initialization entirely; the configured log level
/// seeds the filter unless `RUST_LOG` overrides it.
pub fn init_telemetry(observability: &ObservabilityConfig) -> Result<()> {
    if !observability.tracing_enabled {
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(telemetry_filter(&observability.log_level))
        .init();

    tracing::info!("Switchboard telemetry initialized with structured logging");
    Ok(())
}

/// `RUST_LOG` wins when set; otherwise the configured level applies.
fn telemetry_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span with common delegation attributes
pub fn create_delegation_span(
    operation: &str,
    agent_type: Option<&str>,
    correlation_id: Option<&str>,
) -> tracing::Span {
    tracing::info_span!(
        "agent_delegation",
        operation = operation,
        agent.kind = agent_type,
        correlation.id = correlation_id,
        otel.kind = "internal"
    )
}

/// Shutdown telemetry gracefully
pub fn shutdown_telemetry() {
    // For structured logging, no explicit shutdown needed
    tracing::info!("Switchboard telemetry shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_seeds_the_filter() {
        std::env::remove_var("RUST_LOG");
        let filter = telemetry_filter("debug");
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn disabled_observability_skips_initialization() {
        let observability = ObservabilityConfig {
            tracing_enabled: false,
            log_level: "info".to_string(),
        };
        // No subscriber is installed, so repeated calls stay harmless.
        assert!(init_telemetry(&observability).is_ok());
        assert!(init_telemetry(&observability).is_ok());
    }
}
