//! Cache storage.
//!
//! `CacheStore` is the capability a resource cache is handed; `MemoryStore`
//! is the in-process driver behind the `memory` and `array` driver names.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;
use serde_json::Value;
use tracing::debug;

use super::config::CacheConfig;
use super::error::CacheError;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";
pub(crate) const METRIC_CACHE_EVICT: &str = "tablero_cache_evict_total";

/// Key-value store with per-entry expiry and optional tags.
///
/// Implementations must be safe to share across request handlers. Errors
/// represent an unreachable backend and are surfaced to callers untouched.
pub trait CacheStore: Send + Sync {
    /// Fetch a live entry. Expired entries read as `None`.
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Store `value` under `key` for `ttl`, attached to `tags` (possibly none).
    /// An existing entry under the same key is replaced, tags included.
    fn put(&self, key: &str, value: Value, ttl: Duration, tags: &[String])
    -> Result<(), CacheError>;

    /// Evict every entry.
    fn flush_all(&self) -> Result<(), CacheError>;

    /// Evict every entry attached to any of `tags`, returning how many went.
    fn flush_tags(&self, tags: &[String]) -> Result<usize, CacheError>;
}

struct Entry {
    value: Value,
    /// `None` when `now + ttl` overflows; such entries never expire.
    expires_at: Option<Instant>,
    tags: Vec<String>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| deadline > now)
    }
}

struct Inner {
    entries: LruCache<String, Entry>,
    tagged: HashMap<String, HashSet<String>>,
}

impl Inner {
    fn attach(&mut self, key: &str, tags: &[String]) {
        for tag in tags {
            self.tagged
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
    }

    fn detach(&mut self, key: &str, tags: &[String]) {
        for tag in tags {
            if let Some(keys) = self.tagged.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tagged.remove(tag);
                }
            }
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        match self.entries.pop(key) {
            Some(entry) => {
                self.detach(key, &entry.tags);
                true
            }
            None => false,
        }
    }
}

/// In-memory LRU store with a tag index.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                tagged: HashMap::new(),
            }),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity_non_zero())
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        mutex_lock(&self.inner, SOURCE, "len").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let mut inner = mutex_lock(&self.inner, SOURCE, "get");
        let now = Instant::now();

        match inner.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
            None => return Ok(None),
        }

        inner.remove(key);
        debug!(key, "dropped expired cache entry");
        Ok(None)
    }

    fn put(
        &self,
        key: &str,
        value: Value,
        ttl: Duration,
        tags: &[String],
    ) -> Result<(), CacheError> {
        let mut inner = mutex_lock(&self.inner, SOURCE, "put");
        let entry = Entry {
            value,
            expires_at: Instant::now().checked_add(ttl),
            tags: tags.to_vec(),
        };

        if let Some((displaced_key, displaced)) = inner.entries.push(key.to_string(), entry) {
            inner.detach(&displaced_key, &displaced.tags);
            if displaced_key != key {
                counter!(METRIC_CACHE_EVICT).increment(1);
                debug!(key = %displaced_key, "evicted least recently used cache entry");
            }
        }
        inner.attach(key, tags);
        Ok(())
    }

    fn flush_all(&self) -> Result<(), CacheError> {
        let mut inner = mutex_lock(&self.inner, SOURCE, "flush_all");
        inner.entries.clear();
        inner.tagged.clear();
        Ok(())
    }

    fn flush_tags(&self, tags: &[String]) -> Result<usize, CacheError> {
        let mut inner = mutex_lock(&self.inner, SOURCE, "flush_tags");
        let keys: HashSet<String> = tags
            .iter()
            .filter_map(|tag| inner.tagged.get(tag))
            .flatten()
            .cloned()
            .collect();

        let removed = keys.iter().filter(|key| inner.remove(key)).count();
        Ok(removed)
    }
}
