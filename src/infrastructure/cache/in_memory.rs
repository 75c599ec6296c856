//! In-memory cache implementation using moka

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::cache::{validate_ttl, CacheStore};
use crate::domain::DomainError;

/// Configuration for the in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries before eviction kicks in
    pub max_capacity: u64,
    /// Upper bound moka uses for its own expiry sweep
    pub max_ttl: Duration,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            max_ttl: Duration::from_secs(3600),
        }
    }
}

impl InMemoryCacheConfig {
    /// Sets the maximum number of entries
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Sets the upper TTL bound
    pub fn with_max_ttl(mut self, ttl: Duration) -> Self {
        self.max_ttl = ttl;
        self
    }
}

/// Entry stored in moka; expiry is stamped per entry because moka's
/// time-to-live is cache-wide, not per key.
#[derive(Debug, Clone)]
struct CacheEntry {
    data: String,
    expires_at_millis: u64,
}

/// Thread-safe in-memory cache store backed by moka.
///
/// Used in development and tests where no Redis is available. Prefix
/// deletion walks the whole entry set, which is acceptable at the
/// capacities this backend is configured for.
#[derive(Debug)]
pub struct InMemoryCacheStore {
    cache: MokaCache<String, CacheEntry>,
}

impl InMemoryCacheStore {
    /// Creates a cache store with default configuration
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    /// Creates a cache store with the given configuration
    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.max_ttl)
            .build();

        Self { cache }
    }

    fn current_time_millis() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn is_expired(entry: &CacheEntry) -> bool {
        Self::current_time_millis() > entry.expires_at_millis
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        match self.cache.get(key).await {
            Some(entry) => {
                if Self::is_expired(&entry) {
                    self.cache.remove(key).await;
                    return Ok(None);
                }

                Ok(Some(entry.data))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        validate_ttl(ttl)?;

        let entry = CacheEntry {
            data: value.to_string(),
            expires_at_millis: Self::current_time_millis() + ttl.as_millis() as u64,
        };

        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, DomainError> {
        // Sync pending tasks so the iterator sees recent inserts
        self.cache.run_pending_tasks().await;

        let cache_clone = self.cache.clone();
        let prefix = prefix.to_string();

        let matching: Vec<String> = tokio::task::spawn_blocking(move || {
            cache_clone
                .iter()
                .filter_map(|(k, _)| {
                    let key: &str = k.as_ref();
                    key.starts_with(&prefix).then(|| key.to_string())
                })
                .collect()
        })
        .await
        .map_err(|e| DomainError::cache(format!("Failed to iterate cache: {}", e)))?;

        let mut deleted = 0;

        for key in matching {
            self.cache.remove(&key).await;
            deleted += 1;
        }

        Ok(deleted)
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheStoreExt;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCacheStore::new();

        cache
            .set_json("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get_json("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let cache = InMemoryCacheStore::new();

        let result = cache.get("missing").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let cache = InMemoryCacheStore::new();

        let result = cache.set("key1", "value1", Duration::ZERO).await;
        assert!(matches!(result, Err(DomainError::Cache { .. })));
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCacheStore::new();

        cache
            .set("key1", "value1", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.delete("key1").await.unwrap());
        assert!(cache.get("key1").await.unwrap().is_none());
        assert!(!cache.delete("key1").await.unwrap());
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let cache = InMemoryCacheStore::new();

        cache
            .set("key1", "value1", Duration::from_millis(50))
            .await
            .unwrap();

        assert!(cache.get("key1").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.get("key1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_prefix() {
        let cache = InMemoryCacheStore::new();

        cache
            .set("games:list:page=1:per=20", "[]", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("games:list:page=2:per=20", "[]", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("games:7", "{}", Duration::from_secs(60))
            .await
            .unwrap();

        let deleted = cache.delete_prefix("games:list:").await.unwrap();
        assert_eq!(deleted, 2);

        assert!(cache.get("games:7").await.unwrap().is_some());
        assert!(cache
            .get("games:list:page=1:per=20")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_prefix_no_matches() {
        let cache = InMemoryCacheStore::new();

        cache
            .set("clients:1", "{}", Duration::from_secs(60))
            .await
            .unwrap();

        let deleted = cache.delete_prefix("games:list:").await.unwrap();
        assert_eq!(deleted, 0);
    }

    #[tokio::test]
    async fn test_ping() {
        let cache = InMemoryCacheStore::new();
        assert!(cache.ping().await);
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        let cache = InMemoryCacheStore::new();

        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Payload {
            title: String,
            ids: Vec<i64>,
        }

        let payload = Payload {
            title: "test".to_string(),
            ids: vec![1, 2, 3],
        };

        cache
            .set_json("payload", &payload, Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<Payload> = cache.get_json("payload").await.unwrap();
        assert_eq!(result, Some(payload));
    }
}
