//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::resources::{ResourceName, ResourceRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource `{resource}` not found")]
    NotFound { resource: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl RepoError {
    pub fn not_found(resource: &ResourceName) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
        }
    }
}

/// Source of the records behind `/api/{resource}`.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Names of every known resource collection, sorted.
    async fn resources(&self) -> Result<Vec<ResourceName>, RepoError>;

    /// All records of `resource` in storage order.
    async fn list(&self, resource: &ResourceName) -> Result<Vec<ResourceRecord>, RepoError>;

    /// Append a record, creating the collection if needed. Returns the stored
    /// record, with `id` assigned when it was missing.
    async fn insert(
        &self,
        resource: &ResourceName,
        record: ResourceRecord,
    ) -> Result<ResourceRecord, RepoError>;
}
