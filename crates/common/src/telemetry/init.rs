use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::TelemetryConfig;

/// Initialize structured JSON logging.
///
/// `RUST_LOG` wins when set; otherwise `config.log_level` is used as the filter.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_span_list(true)
        .with_current_span(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    info!(service_name = %config.service_name, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_config_defaults() {
        let config = TelemetryConfig::default();

        assert_eq!(config.service_name, "desk-monitor");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_second_init_is_an_error() {
        let config = TelemetryConfig {
            service_name: "test-service".to_string(),
            log_level: "debug".to_string(),
        };

        // The first call may race with other tests; the second one must fail.
        let _ = init_telemetry(&config);
        assert!(init_telemetry(&config).is_err());
    }
}
