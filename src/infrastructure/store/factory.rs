//! Entity store factory for runtime backend selection

use std::sync::Arc;

use sqlx::PgPool;

use crate::domain::store::EntityStore;
use crate::domain::DomainError;

use super::in_memory::InMemoryEntityStore;
use super::postgres::{validate_collection_name, PostgresEntityStore};

/// Supported store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// In-memory collections, lost on restart
    #[default]
    InMemory,
    /// PostgreSQL, one JSONB table per resource kind
    Postgres,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::InMemory => write!(f, "in_memory"),
            StoreBackend::Postgres => write!(f, "postgres"),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(StoreBackend::InMemory),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            _ => Err(DomainError::configuration(format!(
                "Unknown store backend: {}. Valid backends: in_memory, postgres",
                s
            ))),
        }
    }
}

/// Factory for creating per-resource entity stores
#[derive(Debug, Default)]
pub struct StoreFactory;

impl StoreFactory {
    /// Creates an empty in-memory store
    pub fn create_in_memory() -> Arc<dyn EntityStore> {
        Arc::new(InMemoryEntityStore::new())
    }

    /// Creates a Postgres store over a shared pool and ensures its table.
    ///
    /// The resource kind doubles as the table name, so it must pass the
    /// collection-name check before any SQL is built from it.
    pub async fn create_postgres(
        pool: PgPool,
        resource: &str,
    ) -> Result<Arc<dyn EntityStore>, DomainError> {
        validate_collection_name(resource)?;

        let store = PostgresEntityStore::new(pool, resource);
        store.ensure_table().await?;

        Ok(Arc::new(store))
    }
}
