//! Redis cache implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::domain::cache::{validate_ttl, CacheStore};
use crate::domain::DomainError;

/// Configuration for the Redis cache store
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
}

impl RedisCacheConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key_prefix: None,
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
}

/// Redis cache store.
///
/// Uses `ConnectionManager` for reconnecting connection handling. Prefix
/// deletion runs SCAN with a match pattern and deletes in batches; it is
/// not atomic against concurrent sets on matching keys, so a racing set can
/// leave an entry that outlives the sweep until its TTL expires.
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: ConnectionManager,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCacheStore {
    /// Connects to Redis with the given configuration
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    /// Connects with default configuration
    pub async fn with_url(url: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(RedisCacheConfig::new(url)).await
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let result: Option<String> = conn
            .get(&prefixed_key)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to get key '{}': {}", key, e)))?;

        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        validate_ttl(ttl)?;

        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let ttl_secs = ttl.as_secs().max(1);

        let _: () = conn
            .set_ex(&prefixed_key, value, ttl_secs)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to set key '{}': {}", key, e)))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let deleted: i32 = conn
            .del(&prefixed_key)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to delete key '{}': {}", key, e)))?;

        Ok(deleted > 0)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, DomainError> {
        let pattern = format!("{}*", self.prefix_key(prefix));
        let mut conn = self.connection.clone();

        // SCAN instead of KEYS: bounded work per round trip
        let mut cursor = 0u64;
        let mut total_deleted = 0usize;

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| {
                    DomainError::cache(format!(
                        "Failed to scan keys with prefix '{}': {}",
                        prefix, e
                    ))
                })?;

            if !keys.is_empty() {
                let deleted: i32 = conn
                    .del(&keys)
                    .await
                    .map_err(|e| DomainError::cache(format!("Failed to delete keys: {}", e)))?;
                total_deleted += deleted as usize;
            }

            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(total_deleted)
    }

    async fn ping(&self) -> bool {
        let mut conn = self.connection.clone();

        matches!(
            redis::cmd("PING").query_async::<String>(&mut conn).await,
            Ok(reply) if reply == "PONG"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: These tests require a running Redis instance

    fn get_test_config() -> RedisCacheConfig {
        RedisCacheConfig::new("redis://127.0.0.1:6379").with_key_prefix("test")
    }

    #[test]
    fn test_key_prefix() {
        let config = RedisCacheConfig::new("redis://localhost").with_key_prefix("gateway");
        assert_eq!(config.key_prefix, Some("gateway".to_string()));
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_and_get() {
        let cache = RedisCacheStore::new(get_test_config()).await.unwrap();

        cache
            .set("key1", "\"value1\"", Duration::from_secs(60))
            .await
            .unwrap();

        let result = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("\"value1\"".to_string()));

        // Cleanup
        cache.delete("key1").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_delete() {
        let cache = RedisCacheStore::new(get_test_config()).await.unwrap();

        cache
            .set("key1", "\"value1\"", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.delete("key1").await.unwrap());
        assert!(cache.get("key1").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_delete_prefix() {
        let cache = RedisCacheStore::new(get_test_config()).await.unwrap();

        cache
            .set("games:list:page=1:per=20", "[]", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("games:list:page=2:per=20", "[]", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("games:1", "{}", Duration::from_secs(60))
            .await
            .unwrap();

        let deleted = cache.delete_prefix("games:list:").await.unwrap();
        assert_eq!(deleted, 2);

        assert!(cache.get("games:1").await.unwrap().is_some());

        // Cleanup
        cache.delete("games:1").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_ping() {
        let cache = RedisCacheStore::new(get_test_config()).await.unwrap();
        assert!(cache.ping().await);
    }
}
