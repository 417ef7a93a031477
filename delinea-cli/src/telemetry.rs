//! Tracing setup for the CLI.
//!
//! Logs go to stderr so stdout carries only the lookup result.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable switching log output to JSON.
pub const ENV_LOG_JSON: &str = "DELINEA_LOG_JSON";

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Whether to output JSON format
    pub json_output: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_output: false,
        }
    }
}

impl TracingConfig {
    /// Read overrides from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let json = std::env::var(ENV_LOG_JSON).ok();
        Self::default().with_json_output(is_truthy(json.as_deref()))
    }

    /// Enable or disable JSON output.
    #[must_use]
    pub const fn with_json_output(mut self, json: bool) -> Self {
        self.json_output = json;
        self
    }
}

fn is_truthy(value: Option<&str>) -> bool {
    matches!(
        value.map(str::trim).map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

/// Install the global subscriber. Call once at startup.
pub fn init_tracing(config: &TracingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.log_level, "warn");
        assert!(!config.json_output);
    }

    #[test]
    fn test_config_builder() {
        let config = TracingConfig::default().with_json_output(true);
        assert!(config.json_output);
        assert!(!config.with_json_output(false).json_output);
    }

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy(Some("1")));
        assert!(is_truthy(Some(" TRUE ")));
        assert!(!is_truthy(Some("0")));
        assert!(!is_truthy(None));
    }
}
