use relays::config::OnionooConfig;
use serde::Deserialize;
use site::config::SiteConfig;
use std::fs::File;

fn default_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct LoggingConfig {
    /// Default filter, `RUST_LOG` takes precedence
    #[serde(default = "default_level")]
    pub level: String,
    pub sentry_dsn: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_level(),
            sentry_dsn: None,
        }
    }
}

#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub onionoo: OnionooConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub metrics: Option<MetricsConfig>,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data: Config = serde_yaml::from_reader(file)?;
        data.validate()?;

        Ok(data)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.index_limit == 0 {
            return Err(ConfigError::Invalid("site.index_limit must be at least 1"));
        }
        if self.onionoo.timeout_secs == 0 {
            return Err(ConfigError::Invalid("onionoo.timeout_secs must be at least 1"));
        }
        if self.metrics.as_ref().is_some_and(|m| m.statsd_port == 0) {
            return Err(ConfigError::Invalid("metrics.statsd_port must not be 0"));
        }
        if let Some(dsn) = &self.logging.sentry_dsn
            && dsn.parse::<sentry::types::Dsn>().is_err()
        {
            return Err(ConfigError::Invalid("logging.sentry_dsn is not a valid DSN"));
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}
