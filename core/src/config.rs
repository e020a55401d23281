//! Client configuration.
//!
//! `GeoConfig` deserializes with every field defaulted, so a host can embed
//! it in its own config file, or build it from `INEGI_*` environment
//! variables. The client is only constructed when `enabled` is set.

use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://gaia.inegi.org.mx/wscatgeo";
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub enabled: bool,
    pub base_url: String,
    pub read_timeout_secs: u64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: DEFAULT_BASE_URL.to_string(),
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

impl GeoConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from `INEGI_ENABLED`, `INEGI_BASE_URL` and
    /// `INEGI_READ_TIMEOUT_SECS` as returned by `lookup`. Missing keys keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("INEGI_ENABLED") {
            config.enabled = parse_flag("INEGI_ENABLED", &value)?;
        }
        if let Some(value) = lookup("INEGI_BASE_URL") {
            config.base_url = value.trim().to_string();
        }
        if let Some(value) = lookup("INEGI_READ_TIMEOUT_SECS") {
            config.read_timeout_secs = value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "INEGI_READ_TIMEOUT_SECS".to_string(),
                value: value.clone(),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::BaseUrl(self.base_url.clone()));
        }
        if self.read_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "read_timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
