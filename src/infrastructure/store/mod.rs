//! Store infrastructure - Entity store implementations

mod factory;
mod in_memory;
mod postgres;

pub use factory::{StoreBackend, StoreFactory};
pub use in_memory::InMemoryEntityStore;
pub use postgres::{validate_collection_name, PostgresConfig, PostgresEntityStore};
