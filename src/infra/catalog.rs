//! In-memory resource catalog, optionally seeded from a JSON file.
//!
//! The seed file is a single object mapping resource names to arrays of
//! records: `{"users": [{"id": 1, "nombre": "Ana"}], "tasks": []}`.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use crate::application::repos::{RepoError, ResourceRepository};
use crate::domain::resources::{ResourceName, ResourceRecord};

use super::error::InfraError;

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    collections: RwLock<BTreeMap<ResourceName, Vec<ResourceRecord>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from an already parsed seed document.
    pub fn from_seed(seed: Value) -> Result<Self, String> {
        let Value::Object(map) = seed else {
            return Err("seed must be a JSON object keyed by resource name".to_string());
        };

        let mut collections = BTreeMap::new();
        for (name, records) in map {
            let resource = ResourceName::parse(&name).map_err(|err| err.to_string())?;
            let Value::Array(items) = records else {
                return Err(format!("`{name}` must be an array of records"));
            };
            let records = items
                .into_iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::Object(record) => Ok(record),
                    _ => Err(format!("`{name}[{index}]` is not an object")),
                })
                .collect::<Result<Vec<_>, _>>()?;
            collections.insert(resource, records);
        }

        Ok(Self {
            collections: RwLock::new(collections),
        })
    }

    /// Read and parse a seed file.
    pub async fn load(path: &Path) -> Result<Self, InfraError> {
        let shown = path.display().to_string();
        let raw = tokio::fs::read(path).await?;
        let seed: Value = serde_json::from_slice(&raw)
            .map_err(|err| InfraError::seed(shown.clone(), err.to_string()))?;
        let catalog = Self::from_seed(seed).map_err(|message| InfraError::seed(shown.clone(), message))?;

        let resources = catalog.collections.read().await.len();
        info!(path = %shown, resources, "catalog seeded");
        Ok(catalog)
    }
}

/// One past the largest integer id, or `None` once `i64::MAX` is taken.
fn next_id(records: &[ResourceRecord]) -> Option<i64> {
    records
        .iter()
        .filter_map(|record| record.get("id").and_then(Value::as_i64))
        .max()
        .unwrap_or(0)
        .checked_add(1)
}

#[async_trait]
impl ResourceRepository for InMemoryCatalog {
    async fn resources(&self) -> Result<Vec<ResourceName>, RepoError> {
        Ok(self.collections.read().await.keys().cloned().collect())
    }

    async fn list(&self, resource: &ResourceName) -> Result<Vec<ResourceRecord>, RepoError> {
        self.collections
            .read()
            .await
            .get(resource)
            .cloned()
            .ok_or_else(|| RepoError::not_found(resource))
    }

    async fn insert(
        &self,
        resource: &ResourceName,
        mut record: ResourceRecord,
    ) -> Result<ResourceRecord, RepoError> {
        let mut collections = self.collections.write().await;
        let records = collections.entry(resource.clone()).or_default();

        match record.get("id") {
            None | Some(Value::Null) => {
                let id = next_id(records).ok_or_else(|| RepoError::InvalidInput {
                    message: format!("`{resource}` has no integer id left to assign"),
                })?;
                record.insert("id".to_string(), Value::from(id));
            }
            Some(id) => {
                if records.iter().any(|existing| existing.get("id") == Some(id)) {
                    return Err(RepoError::InvalidInput {
                        message: format!("`{resource}` already has a record with id {id}"),
                    });
                }
            }
        }

        records.push(record.clone());
        Ok(record)
    }
}
