//! Tablero Cache System
//!
//! Resource listings are cached per resource type under namespaced keys:
//!
//! - **Keys** are `<resource>:<suffix>`, where the suffix encodes the filter
//!   and pagination state of the request.
//! - **Tags** group every entry of one resource so it can be evicted at once.
//! - **Drivers** decide the invalidation strategy. Tag-capable drivers evict
//!   only the resource's entries; every other driver flushes the whole store.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! default = "memory"
//! ttl = 3600
//! capacity = 1024
//! ```

pub(crate) mod config;
mod driver;
mod error;
mod keys;
pub(crate) mod lock;
mod policy;
mod store;

pub use config::CacheConfig;
pub use driver::{InvalidationStrategy, TAGGABLE_DRIVERS, driver_supports_tags};
pub use error::CacheError;
pub use keys::{CacheNamespace, Cacheable};
pub use policy::{ClearScope, ResourceCache};
pub(crate) use policy::{METRIC_CACHE_FLUSH, METRIC_CACHE_HIT, METRIC_CACHE_MISS};
pub use store::{CacheStore, MemoryStore};
pub(crate) use store::METRIC_CACHE_EVICT;
