//! PostgreSQL entity store implementation with connection pooling

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use crate::domain::store::{page_offset, EntityStore};
use crate::domain::{Document, DomainError, FilterValue};

/// PostgreSQL connection configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/doc_cache_gateway".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Builds a connection pool from this configuration
    pub async fn connect(&self) -> Result<PgPool, DomainError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(self.connect_timeout_secs))
            .connect(&self.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))
    }
}

/// Checks that a collection name is safe to interpolate as a table name.
///
/// Table names cannot be bound as query parameters, so anything outside
/// `[a-z_][a-z0-9_]*` is rejected before it ever reaches SQL text.
pub fn validate_collection_name(name: &str) -> Result<(), DomainError> {
    let mut chars = name.chars();

    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(DomainError::configuration(format!(
            "Invalid collection name '{}': use lowercase letters, digits and underscores",
            name
        )))
    }
}

/// PostgreSQL-backed document collection.
///
/// One table per resource kind, one JSONB row per document. Filters are
/// applied with JSONB containment so text and numeric values match with
/// their own types. The id column is the single source of truth; the JSONB
/// payload holds only the fields.
pub struct PostgresEntityStore {
    pool: PgPool,
    table: String,
}

impl Debug for PostgresEntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresEntityStore")
            .field("table", &self.table)
            .finish()
    }
}

impl PostgresEntityStore {
    /// Creates a store over an existing pool; the table name must have been
    /// validated with [`validate_collection_name`]
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    /// Ensures the backing table exists
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGINT PRIMARY KEY,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.table
        );

        sqlx::query(&query)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        Ok(())
    }

    fn row_to_document(id: i64, data: Value) -> Result<Document, DomainError> {
        match data {
            Value::Object(fields) => Ok(Document::new(id, fields)),
            other => Err(DomainError::storage(format!(
                "Document {} has a non-object payload: {}",
                id, other
            ))),
        }
    }

    fn containment_filter(filters: &BTreeMap<String, FilterValue>) -> Value {
        Value::Object(
            filters
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }
}

#[async_trait]
impl EntityStore for PostgresEntityStore {
    async fn fetch_by_id(&self, id: i64) -> Result<Option<Document>, DomainError> {
        let query = format!("SELECT data FROM {} WHERE id = $1", self.table);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to fetch document: {}", e)))?;

        match row {
            Some(row) => {
                let data: Value = row.get("data");
                Ok(Some(Self::row_to_document(id, data)?))
            }
            None => Ok(None),
        }
    }

    async fn fetch_filtered(
        &self,
        filters: &BTreeMap<String, FilterValue>,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Document>, DomainError> {
        let filter_doc = Self::containment_filter(filters);

        let rows = if per_page == 0 {
            let query = format!(
                "SELECT id, data FROM {} WHERE data @> $1 ORDER BY id",
                self.table
            );

            sqlx::query(&query)
                .bind(&filter_doc)
                .fetch_all(&self.pool)
                .await
        } else {
            let query = format!(
                "SELECT id, data FROM {} WHERE data @> $1 ORDER BY id OFFSET $2 LIMIT $3",
                self.table
            );

            sqlx::query(&query)
                .bind(&filter_doc)
                .bind(page_offset(page, per_page) as i64)
                .bind(i64::from(per_page))
                .fetch_all(&self.pool)
                .await
        }
        .map_err(|e| DomainError::storage(format!("Failed to fetch documents: {}", e)))?;

        let mut documents = Vec::with_capacity(rows.len());

        for row in rows {
            let id: i64 = row.get("id");
            let data: Value = row.get("data");
            documents.push(Self::row_to_document(id, data)?);
        }

        Ok(documents)
    }

    async fn insert(&self, fields: Map<String, Value>) -> Result<Document, DomainError> {
        // Allocation and write are two statements without a transaction;
        // two racing inserts can pick the same id, in which case the later
        // one fails on the primary key.
        let next_id_query = format!("SELECT COALESCE(MAX(id), 0) + 1 AS next_id FROM {}", self.table);

        let row = sqlx::query(&next_id_query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to allocate id: {}", e)))?;

        let id: i64 = row.get("next_id");

        let insert_query = format!("INSERT INTO {} (id, data) VALUES ($1, $2)", self.table);

        sqlx::query(&insert_query)
            .bind(id)
            .bind(Value::Object(fields.clone()))
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to insert document: {}", e)))?;

        Ok(Document::new(id, fields))
    }

    async fn update(&self, id: i64, fields: Map<String, Value>) -> Result<bool, DomainError> {
        let query = format!("UPDATE {} SET data = $2 WHERE id = $1", self.table);

        let result = sqlx::query(&query)
            .bind(id)
            .bind(Value::Object(fields))
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update document: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, DomainError> {
        let query = format!("DELETE FROM {} WHERE id = $1", self.table);

        let result = sqlx::query(&query)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete document: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let query = format!("SELECT COUNT(*) AS count FROM {}", self.table);

        let row = sqlx::query(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count documents: {}", e)))?;

        let count: i64 = row.get("count");
        Ok(count as u64)
    }
}
