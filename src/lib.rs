//! Document Cache Gateway
//!
//! REST CRUD over a schema-less document store with a cache-aside access
//! layer: reads go through a deterministic-key cache, writes invalidate the
//! affected key namespaces. One gateway instance serves any number of
//! configured resource kinds (games, clients, people, ...).

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use api::state::AppState;
use domain::{CacheAsideGateway, CacheStore, DomainError, EntityStore};
use infrastructure::cache::{CacheBackend, CacheConfig, CacheFactory};
use infrastructure::store::{PostgresConfig, StoreBackend, StoreFactory};

/// Create the application state with all gateways initialized
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let cache = create_cache(config).await?;
    let ttl = Duration::from_secs(config.cache.ttl_seconds);

    let store_backend: StoreBackend = config.store.backend.parse()?;
    info!("Store backend: {}", store_backend);

    let pool = match store_backend {
        StoreBackend::Postgres => {
            let url = config.store.url.clone().ok_or_else(|| {
                DomainError::configuration(
                    "Store URL is required for the postgres backend (set store.url or DATABASE_URL)",
                )
            })?;

            info!("Connecting to PostgreSQL...");
            let pool = PostgresConfig::new(url)
                .with_max_connections(config.store.max_connections)
                .connect()
                .await?;
            info!("PostgreSQL connection established");

            Some(pool)
        }
        StoreBackend::InMemory => None,
    };

    let mut gateways: HashMap<String, Arc<CacheAsideGateway>> = HashMap::new();

    for resource in &config.resources {
        let store: Arc<dyn EntityStore> = match &pool {
            Some(pool) => StoreFactory::create_postgres(pool.clone(), resource).await?,
            None => StoreFactory::create_in_memory(),
        };

        let gateway = CacheAsideGateway::new(resource.clone(), store, cache.clone(), ttl);
        gateways.insert(resource.clone(), Arc::new(gateway));
    }

    info!(
        "Serving {} resource kinds: {}",
        gateways.len(),
        config.resources.join(", ")
    );

    Ok(AppState::new(gateways, cache))
}

async fn create_cache(config: &AppConfig) -> anyhow::Result<Arc<dyn CacheStore>> {
    if config.cache.ttl_seconds == 0 {
        return Err(DomainError::configuration("cache.ttl_seconds must be positive").into());
    }

    let backend: CacheBackend = config.cache.backend.parse()?;
    info!("Cache backend: {}", backend);

    let mut cache_config = CacheConfig {
        backend,
        redis_url: config.cache.url.clone(),
        key_prefix: config.cache.key_prefix.clone(),
        default_ttl: Duration::from_secs(config.cache.ttl_seconds),
        max_capacity: Some(config.cache.max_capacity),
    };

    if backend == CacheBackend::Redis && cache_config.redis_url.is_none() {
        cache_config.redis_url = Some("redis://127.0.0.1:6379".to_string());
    }

    Ok(CacheFactory::create(&cache_config).await?)
}
