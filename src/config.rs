//! Runtime settings read from the process environment.
//!
//! Use [`Config::from_env`] at startup. Tests can supply their own variables via
//! [`Config::from_lookup`] without touching the real environment.

use anyhow::Context;
use std::env;
use std::fmt::{Debug, Display, Formatter};
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

/// Port used when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 8000;

/// Placeholder API key used when `API_KEY` is not set. Must be overridden in any real deployment.
pub const DEFAULT_API_KEY: &str = "default-api-key-change-me";

/// Environment label used when `APP_ENV` is not set.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Severity threshold for emitted log lines.
///
/// Ordered from least to most verbose, so `level <= configured` means "emit".
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    /// Parses the given level, falling back to [`LogLevel::Info`] for unknown values.
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => anyhow::bail!("Unknown log level '{}'", other),
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub api_key: String,
    pub log_level: LogLevel,
    pub environment: String,
}

impl Config {
    /// Loads the configuration from `PORT`, `API_KEY`, `LOG_LEVEL` and `APP_ENV`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT").filter(|port| !port.trim().is_empty()) {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Failed to parse PORT '{}'", port))?,
            None => DEFAULT_PORT,
        };

        Ok(Config {
            port,
            api_key: lookup("API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            log_level: lookup("LOG_LEVEL")
                .map(|level| LogLevel::parse_or_default(&level))
                .unwrap_or_default(),
            environment: lookup("APP_ENV").unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
        })
    }

    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    pub fn uses_default_api_key(&self) -> bool {
        self.api_key == DEFAULT_API_KEY
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            api_key: DEFAULT_API_KEY.to_string(),
            log_level: LogLevel::default(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
        }
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("api_key", &"***")
            .field("log_level", &self.log_level)
            .field("environment", &self.environment)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_for_empty_environment() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.port, 8000);
        assert_eq!(config.api_key, DEFAULT_API_KEY);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.environment, "development");
        assert!(config.uses_default_api_key());
    }

    #[test]
    fn reads_all_variables() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "9090"),
            ("API_KEY", "test-api-key-123"),
            ("LOG_LEVEL", "debug"),
            ("APP_ENV", "production"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.api_key, "test-api-key-123");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.environment, "production");
        assert_eq!(config.bind_address().to_string(), "0.0.0.0:9090");
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("PORT", "eighty")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("PORT", "70000")])).is_err());
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let config = Config::from_lookup(lookup_from(&[("LOG_LEVEL", "verbose")])).unwrap();
        assert_eq!(config.log_level, LogLevel::Info);

        let config = Config::from_lookup(lookup_from(&[("LOG_LEVEL", "WARN")])).unwrap();
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn log_levels_are_ordered_by_verbosity() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = Config {
            api_key: "super-secret".to_string(),
            ..Config::default()
        };

        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
