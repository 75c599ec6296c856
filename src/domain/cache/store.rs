//! Cache store trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

/// Key/value cache with TTL and prefix-bulk deletion.
///
/// The trait works on raw JSON strings to stay dyn-compatible; the typed
/// helpers live on [`CacheStoreExt`]. Implementations surface backend
/// failures as `DomainError::Cache`; recovering from them is the caller's
/// job. The cache is an optimization, never a correctness dependency.
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Gets a raw JSON value, `None` on absent or expired keys
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Sets a raw JSON value with the given TTL; a zero TTL is an error
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Deletes a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Deletes every key starting with `prefix`, returning how many were
    /// removed. Enumeration need not be one atomic backend operation, but
    /// no matching key remains once the call returns.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, DomainError>;

    /// Health probe; returns `false` instead of erroring on failure
    async fn ping(&self) -> bool;
}

/// Extension trait providing typed get/set over serde
pub trait CacheStoreExt: CacheStore {
    /// Gets and deserializes a typed value
    fn get_json<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get(key).await? {
                Some(raw) => {
                    let value: V = serde_json::from_str(&raw).map_err(|e| {
                        DomainError::cache(format!("Failed to deserialize cache value: {}", e))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Serializes and sets a typed value with the given TTL
    fn set_json<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let raw = serde_json::to_string(value).map_err(|e| {
                DomainError::cache(format!("Failed to serialize cache value: {}", e))
            })?;
            self.set(key, &raw, ttl).await
        }
    }
}

impl<T: CacheStore + ?Sized> CacheStoreExt for T {}

/// Validates a TTL before handing it to a backend
pub(crate) fn validate_ttl(ttl: Duration) -> Result<(), DomainError> {
    if ttl.is_zero() {
        return Err(DomainError::cache("TTL must be positive"));
    }
    Ok(())
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock cache for testing: a plain map with optional error injection
    #[derive(Debug, Default)]
    pub struct MockCacheStore {
        entries: Mutex<HashMap<String, String>>,
        error: Mutex<Option<String>>,
    }

    impl MockCacheStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_entry(self, key: &str, value: impl Into<String>) -> Self {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.into());
            self
        }

        /// Makes every subsequent call fail with a cache error
        pub fn with_error(self, error: impl Into<String>) -> Self {
            *self.error.lock().unwrap() = Some(error.into());
            self
        }

        pub fn contains(&self, key: &str) -> bool {
            self.entries.lock().unwrap().contains_key(key)
        }

        pub fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }

        fn check_error(&self) -> Result<(), DomainError> {
            if let Some(error) = self.error.lock().unwrap().clone() {
                return Err(DomainError::cache(error));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CacheStore for MockCacheStore {
        async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
            self.check_error()?;
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
            self.check_error()?;
            validate_ttl(ttl)?;
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<bool, DomainError> {
            self.check_error()?;
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        async fn delete_prefix(&self, prefix: &str) -> Result<usize, DomainError> {
            self.check_error()?;
            let mut entries = self.entries.lock().unwrap();

            let matching: Vec<String> = entries
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect();

            for key in &matching {
                entries.remove(key);
            }

            Ok(matching.len())
        }

        async fn ping(&self) -> bool {
            self.check_error().is_ok()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_set_get() {
            let cache = MockCacheStore::new();
            cache
                .set_json("key1", &"value1", Duration::from_secs(60))
                .await
                .unwrap();

            let result: Option<String> = cache.get_json("key1").await.unwrap();
            assert_eq!(result, Some("value1".to_string()));
        }

        #[tokio::test]
        async fn test_mock_get_missing() {
            let cache = MockCacheStore::new();

            let result: Option<String> = cache.get_json("missing").await.unwrap();
            assert!(result.is_none());
        }

        #[tokio::test]
        async fn test_mock_zero_ttl_rejected() {
            let cache = MockCacheStore::new();

            let result = cache.set("key", "value", Duration::ZERO).await;
            assert!(matches!(result, Err(DomainError::Cache { .. })));
        }

        #[tokio::test]
        async fn test_mock_delete() {
            let cache = MockCacheStore::new().with_entry("key1", "\"v\"");

            assert!(cache.delete("key1").await.unwrap());
            assert!(!cache.delete("key1").await.unwrap());
        }

        #[tokio::test]
        async fn test_mock_delete_prefix() {
            let cache = MockCacheStore::new()
                .with_entry("games:list:page=1:per=20", "[]")
                .with_entry("games:list:page=2:per=20", "[]")
                .with_entry("games:1", "{}")
                .with_entry("clients:list:page=1:per=20", "[]");

            let deleted = cache.delete_prefix("games:list:").await.unwrap();
            assert_eq!(deleted, 2);

            assert!(cache.contains("games:1"));
            assert!(cache.contains("clients:list:page=1:per=20"));
            assert_eq!(cache.len(), 2);
        }

        #[tokio::test]
        async fn test_mock_with_error() {
            let cache = MockCacheStore::new().with_error("backend down");

            assert!(cache.get("key").await.is_err());
            assert!(cache.set("key", "v", Duration::from_secs(1)).await.is_err());
            assert!(!cache.ping().await);
        }
    }
}
