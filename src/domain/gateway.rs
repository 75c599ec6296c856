//! Cache-aside orchestration between the entity store and the cache store

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::cache::{key, CacheStore, CacheStoreExt};
use super::document::Document;
use super::query::QuerySpec;
use super::store::EntityStore;
use super::DomainError;

/// Read-through, write-invalidate access layer for one resource kind.
///
/// Reads check the cache first and fall through to the entity store on a
/// miss; writes run against the store and then drop the affected keys. Every
/// cache failure is recovered locally: a read treats it as a miss, a write
/// skips the invalidation step it could not perform. Store errors propagate.
///
/// Invalidation is deliberately coarse: any write to a resource kind drops
/// the detail key involved plus the entire `list:` and `search:` namespaces
/// of that kind. A reader racing a write may still repopulate a list key
/// from pre-write data between the store mutation and the prefix delete;
/// such an entry lives at most one TTL.
#[derive(Debug, Clone)]
pub struct CacheAsideGateway {
    resource: String,
    store: Arc<dyn EntityStore>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl CacheAsideGateway {
    pub fn new(
        resource: impl Into<String>,
        store: Arc<dyn EntityStore>,
        cache: Arc<dyn CacheStore>,
        ttl: Duration,
    ) -> Self {
        Self {
            resource: resource.into(),
            store,
            cache,
            ttl,
        }
    }

    /// The resource kind this gateway serves
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Lists documents for a query, serving from cache when possible
    pub async fn read_list(&self, spec: &QuerySpec) -> Result<Vec<Document>, DomainError> {
        let cache_key = key::list_key(spec);

        if let Some(documents) = self.cache_lookup::<Vec<Document>>(&cache_key).await {
            return Ok(documents);
        }

        let documents = self
            .store
            .fetch_filtered(&spec.filters, spec.page, spec.per_page)
            .await?;

        self.cache_fill(&cache_key, &documents).await;
        Ok(documents)
    }

    /// Fetches a single document, serving from cache when possible.
    ///
    /// Absent documents are not cached; the next read goes to the store.
    pub async fn read_detail(&self, id: i64) -> Result<Option<Document>, DomainError> {
        let cache_key = key::detail_key(&self.resource, id);

        if let Some(document) = self.cache_lookup::<Document>(&cache_key).await {
            return Ok(Some(document));
        }

        match self.store.fetch_by_id(id).await? {
            Some(document) => {
                self.cache_fill(&cache_key, &document).await;
                Ok(Some(document))
            }
            None => Ok(None),
        }
    }

    /// Inserts a document and invalidates the resource's cached queries
    pub async fn insert(&self, fields: Map<String, Value>) -> Result<Document, DomainError> {
        let document = self.store.insert(fields).await?;
        self.invalidate(Some(document.id)).await;
        Ok(document)
    }

    /// Replaces a document's fields; false when the id is absent.
    ///
    /// Invalidation runs whenever the store call succeeds, whether or not
    /// a record matched.
    pub async fn update(&self, id: i64, fields: Map<String, Value>) -> Result<bool, DomainError> {
        let updated = self.store.update(id, fields).await?;
        self.invalidate(Some(id)).await;
        Ok(updated)
    }

    /// Deletes a document; false when the id is absent
    pub async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let deleted = self.store.delete_by_id(id).await?;
        self.invalidate(Some(id)).await;
        Ok(deleted)
    }

    /// Number of documents behind this gateway, for health probes
    pub async fn store_count(&self) -> Result<u64, DomainError> {
        self.store.count().await
    }

    /// Drops the detail key (when a write names an id) and the whole list
    /// and search namespaces. Runs strictly after the store mutation so a
    /// concurrent reader cannot repopulate pre-write data that then never
    /// gets evicted. Failures are logged and swallowed.
    async fn invalidate(&self, id: Option<i64>) {
        if let Some(id) = id {
            let detail = key::detail_key(&self.resource, id);

            if let Err(e) = self.cache.delete(&detail).await {
                warn!(resource = %self.resource, key = %detail, error = %e, "Cache invalidation failed");
            }
        }

        for prefix in [
            key::list_prefix(&self.resource),
            key::search_prefix(&self.resource),
        ] {
            match self.cache.delete_prefix(&prefix).await {
                Ok(count) => {
                    debug!(resource = %self.resource, prefix = %prefix, count, "Invalidated cached queries");
                }
                Err(e) => {
                    warn!(resource = %self.resource, prefix = %prefix, error = %e, "Cache invalidation failed");
                }
            }
        }
    }

    /// Reads a typed value from the cache; any failure counts as a miss
    async fn cache_lookup<V>(&self, cache_key: &str) -> Option<V>
    where
        V: DeserializeOwned + Send,
    {
        match self.cache.get_json::<V>(cache_key).await {
            Ok(Some(value)) => {
                debug!(resource = %self.resource, key = %cache_key, "Cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(resource = %self.resource, key = %cache_key, "Cache miss");
                None
            }
            Err(e) => {
                warn!(resource = %self.resource, key = %cache_key, error = %e, "Cache read failed, falling back to store");
                None
            }
        }
    }

    /// Best-effort population after a store read
    async fn cache_fill<V>(&self, cache_key: &str, value: &V)
    where
        V: Serialize + Send + Sync,
    {
        if let Err(e) = self.cache.set_json(cache_key, value, self.ttl).await {
            warn!(resource = %self.resource, key = %cache_key, error = %e, "Cache write failed");
        }
    }
}
