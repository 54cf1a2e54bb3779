use std::error::Error;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ConfigError;

/// Logging settings, read alongside the rest of the config by `AppConfig::from_lookup`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub log_level: String,
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            loki_enabled: false,
            loki_url: None,
            service_name: "crypto-price-tracker".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if EnvFilter::try_new(&self.log_level).is_err() {
            return Err(ConfigError::Invalid { key: "RUST_LOG", value: self.log_level.clone() });
        }
        if self.loki_enabled && self.loki_url.is_none() {
            return Err(ConfigError::Missing { key: "LOKI_URL", reason: "LOKI_ENABLED is true" });
        }
        Ok(())
    }
}

/// Installs the global subscriber: `fmt` output always, plus a Loki layer when enabled.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn Error>> {
    config.validate()?;

    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level)?)
        .with(fmt::layer());

    #[cfg(feature = "loki")]
    let registry = registry.with(loki_layer(config)?);

    registry.try_init()?;

    tracing::info!(
        level = %config.log_level,
        loki = config.loki_enabled,
        "Logging initialized for {} ({})",
        config.service_name,
        config.environment
    );
    Ok(())
}

#[cfg(feature = "loki")]
fn loki_layer(config: &LoggingConfig) -> Result<Option<tracing_loki::Layer>, Box<dyn Error>> {
    let Some(loki_url) = config.loki_url.as_deref().filter(|_| config.loki_enabled) else {
        return Ok(None);
    };

    let (layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url::Url::parse(loki_url)?)?;

    // Ships buffered events to Loki in the background
    tokio::spawn(task);
    Ok(Some(layer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(LoggingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_loki_requires_url() {
        let config = LoggingConfig { loki_enabled: true, ..LoggingConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Missing { key: "LOKI_URL", .. })));

        let config = LoggingConfig {
            loki_enabled: true,
            loki_url: Some("http://localhost:3100".into()),
            ..LoggingConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_filter_directive_is_rejected() {
        let config = LoggingConfig { log_level: "crypto_price_tracker=loudest".into(), ..LoggingConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { key: "RUST_LOG", .. })));
    }
}
