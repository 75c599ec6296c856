//! Domain layer - Core business logic and entities

pub mod cache;
pub mod document;
pub mod error;
pub mod gateway;
pub mod query;
pub mod store;

pub use cache::{CacheStore, CacheStoreExt};
pub use document::Document;
pub use error::DomainError;
pub use gateway::CacheAsideGateway;
pub use query::{FilterValue, QuerySpec};
pub use store::EntityStore;
