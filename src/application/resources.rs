//! Cached, paginated listings over resource collections.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tablero_api_types::Paginated;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::application::pagination::{PageRequest, PageSizeBounds};
use crate::application::repos::{RepoError, ResourceRepository};
use crate::cache::lock::mutex_lock;
use crate::cache::{CacheConfig, CacheError, CacheNamespace, CacheStore, ClearScope, ResourceCache};
use crate::domain::error::DomainError;
use crate::domain::resources::{ResourceFilter, ResourceName, ResourceRecord, SortOrder};
use crate::util::query;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// A listing request after defaults and clamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub page: PageRequest,
    pub filter: ResourceFilter,
    pub sort: Option<SortOrder>,
}

impl ListingQuery {
    /// Read `page`, `per_page`, `filter[...]` and `sort` from a raw query string.
    pub fn from_query_str(raw: &str, bounds: &PageSizeBounds) -> Self {
        let parsed = query::parse(raw);
        let text = |key: &str| parsed.get(key).and_then(Value::as_str);

        Self {
            page: PageRequest::from_query(text("page"), text("per_page"), bounds),
            filter: ResourceFilter::from_query(parsed.get("filter")),
            sort: text("sort").and_then(SortOrder::parse),
        }
    }

    /// Cache key suffix; equal requests always produce equal suffixes.
    pub fn cache_suffix(&self) -> String {
        let criteria = json!({
            "filter": self.filter,
            "sort": self.sort.as_ref().map(SortOrder::as_query_value),
        });
        let criteria = query::serialize(&criteria);
        format!(
            "list:{}:{}:{}",
            self.page.page, self.page.per_page, criteria
        )
    }
}

const SOURCE: &str = "application::resources";

/// Lists resources through a per-resource cache namespace.
///
/// All namespaces share one store; entries are tagged with the resource
/// prefix when the configured driver supports tags.
///
/// Listing keys also carry a per-resource generation that every
/// invalidation bumps. A listing computed from a read that raced a write is
/// stored under the old generation and never served again.
#[derive(Clone)]
pub struct ResourceService {
    repo: Arc<dyn ResourceRepository>,
    store: Arc<dyn CacheStore>,
    cache_config: CacheConfig,
    bounds: PageSizeBounds,
    generations: Arc<Mutex<BTreeMap<ResourceName, u64>>>,
}

impl ResourceService {
    pub fn new(
        repo: Arc<dyn ResourceRepository>,
        store: Arc<dyn CacheStore>,
        cache_config: CacheConfig,
        bounds: PageSizeBounds,
    ) -> Self {
        Self {
            repo,
            store,
            cache_config,
            bounds,
            generations: Arc::default(),
        }
    }

    pub fn bounds(&self) -> &PageSizeBounds {
        &self.bounds
    }

    pub fn cache_for(&self, resource: &ResourceName) -> ResourceCache {
        ResourceCache::new(
            CacheNamespace::new(resource.as_str()),
            Arc::clone(&self.store),
            &self.cache_config,
        )
    }

    fn generation(&self, resource: &ResourceName) -> u64 {
        mutex_lock(&self.generations, SOURCE, "generation")
            .get(resource)
            .copied()
            .unwrap_or(0)
    }

    /// Retire every listing key of `resource`, then evict its entries.
    fn invalidate(&self, resource: &ResourceName) -> Result<ClearScope, ResourceError> {
        {
            let mut generations = mutex_lock(&self.generations, SOURCE, "invalidate");
            let generation = generations.entry(resource.clone()).or_insert(0);
            *generation = generation.wrapping_add(1);
        }
        Ok(self.cache_for(resource).clear_all()?)
    }

    pub async fn resources(&self) -> Result<Vec<ResourceName>, ResourceError> {
        Ok(self.repo.resources().await?)
    }

    #[instrument(skip(self, query), fields(resource = %resource))]
    pub async fn list(
        &self,
        resource: &ResourceName,
        query: &ListingQuery,
    ) -> Result<Paginated<ResourceRecord>, ResourceError> {
        let cache = self.cache_for(resource);
        let suffix = format!("g{}:{}", self.generation(resource), query.cache_suffix());

        cache
            .remember_or_compute_async(&suffix, || async {
                let mut records: Vec<ResourceRecord> = self
                    .repo
                    .list(resource)
                    .await?
                    .into_iter()
                    .filter(|record| query.filter.matches(record))
                    .collect();
                if let Some(sort) = &query.sort {
                    sort.apply(&mut records);
                }
                debug!(matched = records.len(), "computed resource listing");
                Ok::<_, ResourceError>(query.page.paginate(&records))
            })
            .await
    }

    /// Store a new record and invalidate the resource's cached listings.
    #[instrument(skip(self, record), fields(resource = %resource))]
    pub async fn create(
        &self,
        resource: &ResourceName,
        record: Value,
    ) -> Result<ResourceRecord, ResourceError> {
        let Value::Object(record) = record else {
            return Err(DomainError::validation("record must be a JSON object").into());
        };
        let stored = self.repo.insert(resource, record).await?;
        self.invalidate(resource)?;
        Ok(stored)
    }

    /// Evict cached listings for `resource`; see [`ResourceCache::clear_all`].
    pub fn clear_cache(&self, resource: &ResourceName) -> Result<ClearScope, ResourceError> {
        self.invalidate(resource)
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::cache::MemoryStore;

    #[derive(Default)]
    struct CountingRepo {
        collections: Mutex<BTreeMap<String, Vec<ResourceRecord>>>,
        reads: AtomicUsize,
        gate: Mutex<Option<Arc<ReadGate>>>,
    }

    /// Holds the next `list` call after its snapshot until released.
    #[derive(Default)]
    struct ReadGate {
        read: Notify,
        release: Notify,
    }

    impl CountingRepo {
        fn with(resource: &str, records: Vec<Value>) -> Self {
            let repo = Self::default();
            let records = records
                .into_iter()
                .filter_map(|value| match value {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect();
            repo.collections
                .lock()
                .expect("collections lock")
                .insert(resource.to_string(), records);
            repo
        }

        fn hold_next_read(&self) -> Arc<ReadGate> {
            let gate = Arc::new(ReadGate::default());
            *self.gate.lock().expect("gate lock") = Some(Arc::clone(&gate));
            gate
        }
    }

    #[async_trait]
    impl ResourceRepository for CountingRepo {
        async fn resources(&self) -> Result<Vec<ResourceName>, RepoError> {
            let collections = self.collections.lock().expect("collections lock");
            collections
                .keys()
                .map(|name| {
                    ResourceName::parse(name).map_err(|err| RepoError::InvalidInput {
                        message: err.to_string(),
                    })
                })
                .collect()
        }

        async fn list(&self, resource: &ResourceName) -> Result<Vec<ResourceRecord>, RepoError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let records = self
                .collections
                .lock()
                .expect("collections lock")
                .get(resource.as_str())
                .cloned();
            let gate = self.gate.lock().expect("gate lock").take();
            if let Some(gate) = gate {
                gate.read.notify_one();
                gate.release.notified().await;
            }
            records.ok_or_else(|| RepoError::not_found(resource))
        }

        async fn insert(
            &self,
            resource: &ResourceName,
            record: ResourceRecord,
        ) -> Result<ResourceRecord, RepoError> {
            let mut collections = self.collections.lock().expect("collections lock");
            collections
                .entry(resource.to_string())
                .or_default()
                .push(record.clone());
            Ok(record)
        }
    }

    fn service(repo: Arc<CountingRepo>, driver: &str) -> ResourceService {
        let config = CacheConfig {
            driver: driver.to_string(),
            ..CacheConfig::default()
        };
        let store = Arc::new(MemoryStore::new(NonZeroUsize::new(64).expect("capacity")));
        ResourceService::new(repo, store, config, PageSizeBounds::default())
    }

    fn users() -> Vec<Value> {
        (1..=25)
            .map(|id| {
                json!({
                    "id": id,
                    "nombre": format!("Usuario {id}"),
                    "status": if id % 2 == 0 { "todo" } else { "done" }
                })
            })
            .collect()
    }

    fn name(raw: &str) -> ResourceName {
        ResourceName::parse(raw).expect("resource name")
    }

    #[test]
    fn listing_query_reads_and_clamps() {
        let query = ListingQuery::from_query_str(
            "page=2&per_page=500&filter%5Bstatus%5D=todo%2Cdone&sort=-id",
            &PageSizeBounds::default(),
        );

        assert_eq!(query.page, PageRequest::new(2, 100));
        assert_eq!(
            query.filter,
            ResourceFilter::default().with("status", &["todo", "done"])
        );
        assert_eq!(query.sort, SortOrder::parse("-id"));
    }

    #[test]
    fn cache_suffix_is_stable_for_equal_queries() {
        let bounds = PageSizeBounds::default();
        let a = ListingQuery::from_query_str("filter[b]=2&filter[a]=1&page=1", &bounds);
        let b = ListingQuery::from_query_str("page=1&filter[a]=1&filter[b]=2", &bounds);
        let c = ListingQuery::from_query_str("page=2&filter[a]=1&filter[b]=2", &bounds);

        assert_eq!(a.cache_suffix(), b.cache_suffix());
        assert_ne!(a.cache_suffix(), c.cache_suffix());
        assert_eq!(
            ListingQuery::from_query_str("", &bounds).cache_suffix(),
            "list:1:10:"
        );
    }

    #[tokio::test]
    async fn second_listing_is_served_from_cache() {
        let repo = Arc::new(CountingRepo::with("users", users()));
        let service = service(Arc::clone(&repo), "memory");
        let query = ListingQuery::from_query_str("per_page=5&filter[status]=todo", service.bounds());

        let first = service.list(&name("users"), &query).await.expect("first");
        let second = service.list(&name("users"), &query).await.expect("second");

        assert_eq!(first, second);
        assert_eq!(first.data.len(), 5);
        assert_eq!(first.meta.total, 12);
        assert_eq!(repo.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn create_invalidates_cached_listings() {
        let repo = Arc::new(CountingRepo::with("users", users()));
        let service = service(Arc::clone(&repo), "memory");
        let query = ListingQuery::from_query_str("", service.bounds());

        let before = service.list(&name("users"), &query).await.expect("before");
        service
            .create(&name("users"), json!({"id": 26, "nombre": "Nuevo"}))
            .await
            .expect("create");
        let after = service.list(&name("users"), &query).await.expect("after");

        assert_eq!(before.meta.total, 25);
        assert_eq!(after.meta.total, 26);
        assert_eq!(repo.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn listing_that_races_a_create_is_not_served_afterwards() {
        let repo = Arc::new(CountingRepo::with("users", users()));
        let service = service(Arc::clone(&repo), "memory");
        let query = ListingQuery::from_query_str("", service.bounds());
        let gate = repo.hold_next_read();

        let racing = {
            let service = service.clone();
            let query = query.clone();
            tokio::spawn(async move { service.list(&name("users"), &query).await })
        };
        gate.read.notified().await;
        service
            .create(&name("users"), json!({"id": 26, "nombre": "Nuevo"}))
            .await
            .expect("create");
        gate.release.notify_one();

        let raced = racing.await.expect("join").expect("racing list");
        assert_eq!(raced.meta.total, 25);

        let after = service.list(&name("users"), &query).await.expect("after");
        assert_eq!(after.meta.total, 26);
        assert_eq!(repo.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn create_rejects_non_objects() {
        let repo = Arc::new(CountingRepo::with("users", users()));
        let service = service(repo, "memory");

        let err = service
            .create(&name("users"), json!([1, 2]))
            .await
            .expect_err("array rejected");
        assert!(matches!(err, ResourceError::Domain(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn clear_scope_follows_driver() {
        let repo = Arc::new(CountingRepo::with("users", users()));
        assert_eq!(
            service(Arc::clone(&repo), "redis")
                .clear_cache(&name("users"))
                .expect("clear"),
            ClearScope::Tags
        );
        assert_eq!(
            service(repo, "file").clear_cache(&name("users")).expect("clear"),
            ClearScope::All
        );
    }

    #[tokio::test]
    async fn unknown_resource_is_a_repo_error() {
        let repo = Arc::new(CountingRepo::default());
        let service = service(repo, "memory");
        let query = ListingQuery::from_query_str("", service.bounds());

        let err = service
            .list(&name("ghosts"), &query)
            .await
            .expect_err("unknown resource");
        assert!(matches!(err, ResourceError::Repo(RepoError::NotFound { .. })));
    }
}
