//! Cache store implementations

mod in_memory;
mod postgres;

pub use in_memory::InMemoryCacheStore;
pub use postgres::{PgCacheStore, PgCacheStoreConfig};
