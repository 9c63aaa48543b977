//! Per-resource cache policy: compute-or-fetch and invalidation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::config::CacheConfig;
use super::driver::InvalidationStrategy;
use super::error::CacheError;
use super::keys::{CacheNamespace, Cacheable};
use super::store::CacheStore;

pub(crate) const METRIC_CACHE_HIT: &str = "tablero_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "tablero_cache_miss_total";
pub(crate) const METRIC_CACHE_FLUSH: &str = "tablero_cache_flush_total";

/// What a `clear_all` call actually evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    /// Only entries tagged with the resource namespace.
    Tags,
    /// The entire store, other resources included.
    All,
}

impl ClearScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tags => "tags",
            Self::All => "all",
        }
    }
}

/// Cache policy for a single resource namespace.
///
/// The invalidation strategy is fixed when the policy is built from the
/// configured driver name. Cheap to clone.
#[derive(Clone)]
pub struct ResourceCache {
    namespace: CacheNamespace,
    store: Arc<dyn CacheStore>,
    strategy: InvalidationStrategy,
    ttl: Duration,
}

impl ResourceCache {
    pub fn new(namespace: CacheNamespace, store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            namespace,
            store,
            strategy: InvalidationStrategy::for_driver(&config.driver),
            ttl: config.ttl(),
        }
    }

    /// Policy for a type whose namespace derives from its name.
    pub fn for_type<T: Cacheable>(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self::new(T::cache_namespace(), store, config)
    }

    /// Override the entry lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn namespace(&self) -> &CacheNamespace {
        &self.namespace
    }

    pub fn prefix(&self) -> &str {
        self.namespace.prefix()
    }

    pub fn key(&self, suffix: &str) -> String {
        self.namespace.key(suffix)
    }

    pub fn tags(&self) -> Vec<String> {
        self.namespace.tags()
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl.as_secs()
    }

    pub fn strategy(&self) -> InvalidationStrategy {
        self.strategy
    }

    /// Return the cached value for `suffix`, or run `producer` and cache its
    /// result. Producer errors are returned as-is and nothing is stored.
    pub fn remember_or_compute<T, E, F>(&self, suffix: &str, producer: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Result<T, E>,
    {
        let key = self.key(suffix);
        if let Some(value) = self.lookup(&key)? {
            return Ok(value);
        }

        let value = producer()?;
        self.store_value(&key, &value)?;
        Ok(value)
    }

    /// Async flavour of [`remember_or_compute`](Self::remember_or_compute)
    /// for producers that hit a repository.
    pub async fn remember_or_compute_async<T, E, F, Fut>(
        &self,
        suffix: &str,
        producer: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = self.key(suffix);
        if let Some(value) = self.lookup(&key)? {
            return Ok(value);
        }

        let value = producer().await?;
        self.store_value(&key, &value)?;
        Ok(value)
    }

    /// Evict this resource's entries.
    ///
    /// Without tag support the whole store is flushed, which also drops every
    /// other resource's entries.
    pub fn clear_all(&self) -> Result<ClearScope, CacheError> {
        let scope = match self.strategy {
            InvalidationStrategy::Tagged => {
                let removed = self.store.flush_tags(&self.tags())?;
                debug!(resource = %self.namespace, removed, "flushed tagged cache entries");
                ClearScope::Tags
            }
            InvalidationStrategy::FlushAll => {
                self.store.flush_all()?;
                info!(
                    resource = %self.namespace,
                    "cache driver lacks tag support; flushed entire cache store"
                );
                ClearScope::All
            }
        };

        counter!(
            METRIC_CACHE_FLUSH,
            "resource" => self.namespace.prefix().to_string(),
            "scope" => scope.as_str()
        )
        .increment(1);
        Ok(scope)
    }

    fn lookup<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let resource = self.namespace.prefix().to_string();

        if let Some(raw) = self.store.get(key)? {
            match serde_json::from_value(raw) {
                Ok(value) => {
                    counter!(METRIC_CACHE_HIT, "resource" => resource).increment(1);
                    debug!(key, outcome = "hit", "resource cache lookup");
                    return Ok(Some(value));
                }
                Err(err) => {
                    warn!(key, error = %err, "cached value has unexpected shape; recomputing");
                }
            }
        }

        counter!(METRIC_CACHE_MISS, "resource" => resource).increment(1);
        debug!(key, outcome = "miss", "resource cache lookup");
        Ok(None)
    }

    fn store_value<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let encoded = serde_json::to_value(value).map_err(|source| CacheError::Encode {
            key: key.to_string(),
            source,
        })?;
        let tags = match self.strategy {
            InvalidationStrategy::Tagged => self.tags(),
            InvalidationStrategy::FlushAll => Vec::new(),
        };
        self.store.put(key, encoded, self.ttl, &tags)
    }
}
