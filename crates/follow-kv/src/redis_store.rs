//! Redis-backed set store: SADD/SREM/SMEMBERS, with batches sent as one MULTI/EXEC pipeline.

use async_trait::async_trait;
use follow_types::{KeyValueStore, KvStoreError, SetOp};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Redis set store over a reconnecting multiplexed connection.
pub struct RedisKvStore {
    conn: ConnectionManager,
}

impl RedisKvStore {
    /// Connect to `url` (e.g. `redis://127.0.0.1/`).
    pub async fn connect(url: &str) -> Result<Self, KvStoreError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(unavailable)?;
        Ok(Self { conn })
    }
}

fn unavailable(e: redis::RedisError) -> KvStoreError {
    KvStoreError::Unavailable(e.to_string())
}

fn batch_error(e: redis::RedisError) -> KvStoreError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
    {
        unavailable(e)
    } else {
        KvStoreError::BatchFailed(e.to_string())
    }
}

/// MULTI/EXEC pipeline applying every op; replies are discarded.
fn batch_pipeline(ops: &[SetOp]) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic();
    for op in ops {
        match op {
            SetOp::Add { key, member } => {
                pipe.sadd(key, member).ignore();
            }
            SetOp::Remove { key, member } => {
                pipe.srem(key, member).ignore();
            }
        }
    }
    pipe
}

#[async_trait]
impl KeyValueStore for RedisKvStore {
    async fn set_add(&self, key: &str, member: &str) -> Result<bool, KvStoreError> {
        let mut conn = self.conn.clone();
        let added: i64 = conn.sadd(key, member).await.map_err(unavailable)?;
        Ok(added > 0)
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<bool, KvStoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.srem(key, member).await.map_err(unavailable)?;
        Ok(removed > 0)
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, KvStoreError> {
        let mut conn = self.conn.clone();
        conn.smembers(key).await.map_err(unavailable)
    }

    async fn atomic_batch(&self, ops: &[SetOp]) -> Result<(), KvStoreError> {
        if ops.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let _: () = batch_pipeline(ops)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "redis batch failed");
                batch_error(e)
            })?;
        Ok(())
    }
}
