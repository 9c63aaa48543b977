//! Cache key definitions.
//!
//! Every resource owns a namespace; keys and tags are derived from it.

use std::any::type_name;
use std::fmt;

/// Lowercase namespace of one resource type, e.g. `invoice`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheNamespace(String);

impl CacheNamespace {
    /// Build a namespace from an explicit resource name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_lowercase())
    }

    /// Derive the namespace from a Rust type's own name, ignoring its module
    /// path and generic arguments: `crate::domain::RiskFactor<T>` becomes
    /// `riskfactor`.
    pub fn of<T: ?Sized>() -> Self {
        Self::new(base_type_name(type_name::<T>()))
    }

    /// The namespace itself.
    pub fn prefix(&self) -> &str {
        &self.0
    }

    /// `<prefix>:<suffix>`. The suffix must distinguish
    /// entries within the namespace.
    pub fn key(&self, suffix: &str) -> String {
        format!("{}:{}", self.0, suffix)
    }

    /// Tags attached to every entry of the namespace: just the prefix.
    pub fn tags(&self) -> Vec<String> {
        vec![self.0.clone()]
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Types whose listings are cached under their own namespace.
pub trait Cacheable {
    fn cache_namespace() -> CacheNamespace {
        CacheNamespace::of::<Self>()
    }
}

fn base_type_name(full: &str) -> &str {
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}
