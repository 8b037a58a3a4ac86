//! Factory configuration.
//!
//! Values absent from the TOML source fall back to the built-in defaults:
//! 20 attempts, 250 ms apart, every namespace constructed.

use crate::core::{RetryPolicy, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Settings for a [`StatefulFactory`](crate::factory::StatefulFactory).
///
/// # Example
///
/// ```rust
/// use statekeeper::config::FactoryConfig;
///
/// let config = FactoryConfig::from_toml_str(r#"
///     retry_attempts = 5
///     namespace = "billing"
/// "#).unwrap();
///
/// assert_eq!(config.retry_attempts, 5);
/// assert_eq!(config.retry_interval_ms, 250);
/// assert_eq!(config.namespace.as_deref(), Some("billing"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryConfig {
    /// Attempts per dispatch for handlers that declare no retry policy.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Delay between attempts for handlers that declare no retry policy.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Only construct handlers declared in this namespace.
    #[serde(default)]
    pub namespace: Option<String>,
}

fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}

fn default_retry_interval_ms() -> u64 {
    DEFAULT_RETRY_INTERVAL_MS
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
            retry_interval_ms: default_retry_interval_ms(),
            namespace: None,
        }
    }
}

impl FactoryConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.retry_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_uses_defaults() {
        let config = FactoryConfig::from_toml_str("").unwrap();
        assert_eq!(config, FactoryConfig::default());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn overrides_are_read() {
        let config = FactoryConfig::from_toml_str(
            r#"
            retry_attempts = 1
            retry_interval_ms = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.retry_policy(), RetryPolicy::new(1, 1));
        assert!(config.namespace.is_none());
    }

    #[test]
    fn malformed_source_is_an_error() {
        let err = FactoryConfig::from_toml_str("retry_attempts = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
