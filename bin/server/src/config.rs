//! Centralized server configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables, e.g. `COURIER__DATABASE_URL` and
//! `COURIER__PROVIDER__MAX_ATTEMPTS`.

use courier_messaging::RetryPolicy;
use serde::Deserialize;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Address the HTTP server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Provider gateway configuration.
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Provider gateway retry configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Maximum send attempts before reporting failure.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff time unit in milliseconds; attempt `n` waits `2^n` units.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl ProviderConfig {
    /// Converts to the messaging crate's retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from `COURIER__`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("COURIER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_config_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay_ms, 1000);
    }

    #[test]
    fn retry_policy_conversion() {
        let config = ProviderConfig {
            max_attempts: 5,
            base_delay_ms: 250,
        };
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
    }
}
