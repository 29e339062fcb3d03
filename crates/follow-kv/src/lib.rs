//! Set store trait with in-memory, Redis and SQLite implementations.

mod memory;

#[cfg(feature = "redis")]
mod redis_store;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use follow_types::{KeyValueStore, KvStoreError, SetOp};
pub use memory::InMemoryKvStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisKvStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteKvStore;
