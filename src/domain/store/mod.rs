//! Entity store abstraction over a persistent document collection

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::document::Document;
use super::query::FilterValue;
use super::DomainError;

/// Computes the number of records to skip for a page.
///
/// `per_page = 0` disables pagination entirely; callers must check that
/// before applying skip/limit.
pub fn page_offset(page: u32, per_page: u32) -> u64 {
    (u64::from(page.max(1)) - 1) * u64::from(per_page)
}

/// Persistent collection of schema-less documents for one resource kind.
///
/// Each resource kind gets its own store instance; the gateway is parametric
/// over this trait and never touches the backing collection directly.
#[async_trait]
pub trait EntityStore: Send + Sync + Debug {
    /// Fetches a single document by id
    async fn fetch_by_id(&self, id: i64) -> Result<Option<Document>, DomainError>;

    /// Fetches documents matching every filter, in stable id order, with
    /// `skip = (page-1)*per_page` and `limit = per_page`; `per_page = 0`
    /// returns all matches.
    async fn fetch_filtered(
        &self,
        filters: &BTreeMap<String, FilterValue>,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Document>, DomainError>;

    /// Inserts a new document, allocating its id as one past the current
    /// maximum (1 for an empty collection). Ids are never reused, even after
    /// deletion. Allocation and write are separate steps: two racing inserts
    /// can compute the same id.
    async fn insert(&self, fields: Map<String, Value>) -> Result<Document, DomainError>;

    /// Replaces all fields of an existing document; false when the id is absent
    async fn update(&self, id: i64, fields: Map<String, Value>) -> Result<bool, DomainError>;

    /// Deletes a document by id; false when the id is absent
    async fn delete_by_id(&self, id: i64) -> Result<bool, DomainError>;

    /// Number of documents in the collection
    async fn count(&self) -> Result<u64, DomainError>;
}
