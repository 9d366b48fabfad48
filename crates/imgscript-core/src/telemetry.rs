//! Tracing subscriber setup

use crate::config::LoggingConfig;
use crate::error::ConfigError;
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` if set, else the configured directives
///
/// # Errors
/// - `ConfigError::Filter` if the configured directives do not parse
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter).map_err(|err| ConfigError::Filter {
        filter: config.filter.clone(),
        reason: err.to_string(),
    })
}

/// Install the global subscriber, writing to stderr
///
/// # Errors
/// - `ConfigError::Filter` for bad directives
/// - `ConfigError::TracingInstalled` if a subscriber already exists
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| ConfigError::TracingInstalled(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_directives() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            filter: "imgscript=notalevel".to_string(),
            json: false,
        };
        assert!(matches!(env_filter(&config), Err(ConfigError::Filter { .. })));
    }

    #[test]
    fn second_init_reports_existing_subscriber() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config);
        assert!(matches!(
            init_tracing(&config),
            Err(ConfigError::TracingInstalled(_))
        ));
    }
}
