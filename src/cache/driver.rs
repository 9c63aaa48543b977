//! Driver capabilities and the invalidation strategy derived from them.

use std::fmt;

/// Drivers able to evict a group of entries by tag.
pub const TAGGABLE_DRIVERS: [&str; 4] = ["array", "memory", "redis", "memcached"];

/// Returns true when `driver` can evict entries by tag.
///
/// Matching is exact; `"Redis"` is not a known driver.
pub fn driver_supports_tags(driver: &str) -> bool {
    TAGGABLE_DRIVERS.contains(&driver)
}

/// How a resource cache stores and clears its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationStrategy {
    /// Entries carry the resource tags; clearing evicts only those tags.
    Tagged,
    /// Entries are stored untagged; clearing flushes the entire store.
    FlushAll,
}

impl InvalidationStrategy {
    pub fn for_driver(driver: &str) -> Self {
        if driver_supports_tags(driver) {
            Self::Tagged
        } else {
            Self::FlushAll
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tagged => "tagged",
            Self::FlushAll => "flush_all",
        }
    }
}

impl fmt::Display for InvalidationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
