//! Cache configuration.
//!
//! Mirrors the `[cache]` section of `tablero.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

pub(crate) const DEFAULT_DRIVER: &str = "memory";
pub(crate) const DEFAULT_TTL_SECS: u64 = 3600;
pub(crate) const DEFAULT_CAPACITY: usize = 1024;

/// Cache configuration resolved from settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Name of the active cache driver (`cache.default`).
    pub driver: String,
    /// Entry lifetime in seconds (`cache.ttl`).
    pub ttl_seconds: u64,
    /// Maximum number of entries kept by the in-memory store.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            driver: DEFAULT_DRIVER.to_string(),
            ttl_seconds: DEFAULT_TTL_SECS,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            driver: settings.driver.clone(),
            ttl_seconds: settings.ttl_seconds.get(),
            capacity: settings.capacity.get(),
        }
    }
}

impl CacheConfig {
    /// Entry lifetime. A zero TTL never reaches here through settings, which
    /// reject it, but direct construction falls back to the default.
    pub fn ttl(&self) -> Duration {
        match self.ttl_seconds {
            0 => Duration::from_secs(DEFAULT_TTL_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Returns the store capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.driver, "memory");
        assert_eq!(config.ttl_seconds, 3600);
        assert_eq!(config.capacity, 1024);
        assert_eq!(config.ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn zero_ttl_falls_back_to_default() {
        let config = CacheConfig {
            ttl_seconds: 0,
            ..Default::default()
        };
        assert_eq!(config.ttl(), Duration::from_secs(DEFAULT_TTL_SECS));
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.capacity_non_zero().get(), 1);
    }
}
