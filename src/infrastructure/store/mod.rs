//! Document store implementations

mod in_memory;
mod postgres;

pub use in_memory::InMemoryDocumentStore;
pub use postgres::{parse_pgvector, pgvector_literal, PgDocumentStore, PgDocumentStoreConfig};
