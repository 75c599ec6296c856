//! In-memory entity store implementation

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::store::{page_offset, EntityStore};
use crate::domain::{Document, DomainError, FilterValue};

/// Thread-safe in-memory document collection.
///
/// Useful for testing and development. Data is lost when the process
/// terminates. Documents are kept in a BTreeMap keyed by id, which gives
/// the stable id ordering the filtered fetch contract requires.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    documents: RwLock<BTreeMap<i64, Map<String, Value>>>,
}

impl InMemoryEntityStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with documents
    pub fn with_documents(documents: Vec<Document>) -> Self {
        let store = Self::new();
        {
            let mut map = store.documents.write().unwrap();

            for document in documents {
                map.insert(document.id, document.fields);
            }
        }
        store
    }

    fn matches(fields: &Map<String, Value>, filters: &BTreeMap<String, FilterValue>) -> bool {
        filters
            .iter()
            .all(|(name, value)| fields.get(name) == Some(&value.to_json()))
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn fetch_by_id(&self, id: i64) -> Result<Option<Document>, DomainError> {
        let documents = self
            .documents
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(documents
            .get(&id)
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn fetch_filtered(
        &self,
        filters: &BTreeMap<String, FilterValue>,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Document>, DomainError> {
        let documents = self
            .documents
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        let matching = documents
            .iter()
            .filter(|(_, fields)| Self::matches(fields, filters))
            .map(|(id, fields)| Document::new(*id, fields.clone()));

        if per_page == 0 {
            return Ok(matching.collect());
        }

        Ok(matching
            .skip(page_offset(page, per_page) as usize)
            .take(per_page as usize)
            .collect())
    }

    async fn insert(&self, fields: Map<String, Value>) -> Result<Document, DomainError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?;

        let id = documents.keys().next_back().copied().unwrap_or(0) + 1;
        documents.insert(id, fields.clone());

        Ok(Document::new(id, fields))
    }

    async fn update(&self, id: i64, fields: Map<String, Value>) -> Result<bool, DomainError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?;

        if !documents.contains_key(&id) {
            return Ok(false);
        }

        documents.insert(id, fields);
        Ok(true)
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, DomainError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(documents.remove(&id).is_some())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let documents = self
            .documents
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(documents.len() as u64)
    }
}
