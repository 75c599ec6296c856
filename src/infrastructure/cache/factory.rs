//! Cache factory for runtime backend selection

use std::sync::Arc;
use std::time::Duration;

use crate::domain::cache::CacheStore;
use crate::domain::DomainError;

use super::in_memory::{InMemoryCacheConfig, InMemoryCacheStore};
use super::redis::{RedisCacheConfig, RedisCacheStore};

/// Supported cache backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    /// In-memory cache using moka
    #[default]
    InMemory,
    /// Redis cache
    Redis,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::InMemory => write!(f, "in_memory"),
            CacheBackend::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for CacheBackend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(CacheBackend::InMemory),
            "redis" => Ok(CacheBackend::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache backend: {}. Valid backends: in_memory, redis",
                s
            ))),
        }
    }
}

/// Configuration for the cache factory
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Backend to create
    pub backend: CacheBackend,
    /// Redis URL (required for the Redis backend)
    pub redis_url: Option<String>,
    /// Key prefix for namespacing (Redis only)
    pub key_prefix: Option<String>,
    /// Default TTL applied to gateway cache fills
    pub default_ttl: Duration,
    /// Maximum capacity (in-memory only)
    pub max_capacity: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::InMemory,
            redis_url: None,
            key_prefix: None,
            default_ttl: Duration::from_secs(120),
            max_capacity: Some(10_000),
        }
    }
}

impl CacheConfig {
    /// Creates a new configuration for the in-memory backend
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a new configuration for the Redis backend
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            backend: CacheBackend::Redis,
            redis_url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the default TTL
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Sets the maximum capacity (in-memory only)
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }
}

/// Factory for creating cache store instances
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    /// Creates a cache store based on configuration
    pub async fn create(config: &CacheConfig) -> Result<Arc<dyn CacheStore>, DomainError> {
        match config.backend {
            CacheBackend::InMemory => {
                let mut in_memory_config = InMemoryCacheConfig::default();

                if let Some(capacity) = config.max_capacity {
                    in_memory_config = in_memory_config.with_max_capacity(capacity);
                }

                Ok(Arc::new(InMemoryCacheStore::with_config(in_memory_config)))
            }
            CacheBackend::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for the Redis cache backend")
                })?;

                let mut redis_config = RedisCacheConfig::new(url);

                if let Some(prefix) = &config.key_prefix {
                    redis_config = redis_config.with_key_prefix(prefix.clone());
                }

                let cache = RedisCacheStore::new(redis_config).await?;
                Ok(Arc::new(cache))
            }
        }
    }
}
