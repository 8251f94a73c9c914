//! Cache configuration.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_CAPACITY: usize = 100;
const DEFAULT_REVALIDATE_SECS: u64 = 60;

/// Cache configuration.
///
/// Usually read from the `cache` section of the site configuration:
///
/// ```
/// use blog_cache::CacheConfig;
///
/// let config = CacheConfig::from_json(r#"{ "capacity": 500 }"#).unwrap();
/// assert!(config.enabled);
/// assert_eq!(config.capacity, 500);
/// assert_eq!(config.default_revalidate_secs, 60);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false every cached read goes straight to the data source.
    pub enabled: bool,
    /// Maximum entries held by the memory store.
    pub capacity: usize,
    /// TTL used by cached computations that do not set their own.
    pub default_revalidate_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
            default_revalidate_secs: DEFAULT_REVALIDATE_SECS,
        }
    }
}

impl CacheConfig {
    /// Parse and validate a JSON configuration; missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` on malformed JSON or invalid values.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: CacheConfig =
            serde_json::from_str(raw).map_err(|e| Error::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_default_revalidate(mut self, ttl: Duration) -> Self {
        self.default_revalidate_secs = ttl.as_secs();
        self
    }

    pub fn default_revalidate(&self) -> Duration {
        Duration::from_secs(self.default_revalidate_secs)
    }

    /// # Errors
    ///
    /// Returns `Error::ConfigError` if capacity or the default TTL is zero.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::ConfigError(
                "capacity must be greater than zero".to_string(),
            ));
        }
        if self.default_revalidate_secs == 0 {
            return Err(Error::ConfigError(
                "default_revalidate_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
