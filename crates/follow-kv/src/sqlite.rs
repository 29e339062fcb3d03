//! SQLite-backed set store (persistence across restarts).

use async_trait::async_trait;
use follow_types::{KeyValueStore, KvStoreError, SetOp};
use std::path::Path;

/// SQLite-backed set store. Each set member is one row; a batch is one transaction.
pub struct SqliteKvStore {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteKvStore {
    /// Open (or create) a store at the given path. `":memory:"` gives a private in-memory database.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, KvStoreError> {
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| KvStoreError::Unavailable(e.to_string()))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS set_members (
                set_key TEXT NOT NULL,
                member TEXT NOT NULL,
                PRIMARY KEY (set_key, member)
            ) WITHOUT ROWID;
            "#,
        )
        .map_err(|e| KvStoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T, KvStoreError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<T, rusqlite::Error>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| KvStoreError::Unavailable(format!("failed to acquire lock: {}", e)))?;
        f(&mut conn).map_err(|e| KvStoreError::Unavailable(e.to_string()))
    }
}

/// Apply every op in one transaction; dropping the transaction uncommitted rolls it back.
fn apply_batch(conn: &mut rusqlite::Connection, ops: &[SetOp]) -> Result<(), rusqlite::Error> {
    let tx = conn.transaction()?;
    for op in ops {
        match op {
            SetOp::Add { key, member } => tx.execute(
                "INSERT OR IGNORE INTO set_members (set_key, member) VALUES (?1, ?2)",
                rusqlite::params![key, member],
            )?,
            SetOp::Remove { key, member } => tx.execute(
                "DELETE FROM set_members WHERE set_key = ?1 AND member = ?2",
                rusqlite::params![key, member],
            )?,
        };
    }
    tx.commit()
}

#[async_trait]
impl KeyValueStore for SqliteKvStore {
    async fn set_add(&self, key: &str, member: &str) -> Result<bool, KvStoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO set_members (set_key, member) VALUES (?1, ?2)",
                rusqlite::params![key, member],
            )
        })
        .map(|n| n > 0)
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<bool, KvStoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM set_members WHERE set_key = ?1 AND member = ?2",
                rusqlite::params![key, member],
            )
        })
        .map(|n| n > 0)
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, KvStoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT member FROM set_members WHERE set_key = ?1")?;
            let rows = stmt.query_map([key], |row| row.get::<_, String>(0))?;
            rows.collect()
        })
    }

    async fn atomic_batch(&self, ops: &[SetOp]) -> Result<(), KvStoreError> {
        if ops.is_empty() {
            return Ok(());
        }
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| KvStoreError::Unavailable(format!("failed to acquire lock: {}", e)))?;
        apply_batch(&mut conn, ops).map_err(|e| {
            tracing::warn!(error = %e, "sqlite batch rolled back");
            KvStoreError::BatchFailed(e.to_string())
        })
    }
}
