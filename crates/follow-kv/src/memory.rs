//! In-memory set store. One lock guards every set so a batch is applied as a single unit.

use follow_types::{KeyValueStore, KvStoreError, SetOp};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

type SetIndex = HashMap<String, HashSet<String>>;

/// In-memory implementation of KeyValueStore.
/// Sets are keyed by name; a set that becomes empty is dropped from the map.
pub struct InMemoryKvStore {
    sets: RwLock<SetIndex>,
    /// When false every call fails with `KvStoreError::Unavailable`.
    available: AtomicBool,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self {
            sets: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Toggle simulated reachability. Used to exercise store-outage paths.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of non-empty sets currently held.
    pub async fn len(&self) -> usize {
        self.sets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sets.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), KvStoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(KvStoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ))
        }
    }

    fn insert_member(sets: &mut SetIndex, key: &str, member: &str) -> bool {
        sets.entry(key.to_string())
            .or_default()
            .insert(member.to_string())
    }

    fn remove_member(sets: &mut SetIndex, key: &str, member: &str) -> bool {
        let Some(set) = sets.get_mut(key) else {
            return false;
        };
        let removed = set.remove(member);
        if set.is_empty() {
            sets.remove(key);
        }
        removed
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for InMemoryKvStore {
    async fn set_add(&self, key: &str, member: &str) -> Result<bool, KvStoreError> {
        self.check_available()?;
        let mut guard = self.sets.write().await;
        Ok(Self::insert_member(&mut guard, key, member))
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<bool, KvStoreError> {
        self.check_available()?;
        let mut guard = self.sets.write().await;
        Ok(Self::remove_member(&mut guard, key, member))
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, KvStoreError> {
        self.check_available()?;
        let guard = self.sets.read().await;
        Ok(guard
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn atomic_batch(&self, ops: &[SetOp]) -> Result<(), KvStoreError> {
        self.check_available()?;
        if ops.is_empty() {
            return Ok(());
        }
        let mut guard = self.sets.write().await;
        for op in ops {
            match op {
                SetOp::Add { key, member } => {
                    Self::insert_member(&mut guard, key, member);
                }
                SetOp::Remove { key, member } => {
                    Self::remove_member(&mut guard, key, member);
                }
            }
        }
        tracing::trace!(ops = ops.len(), "applied in-memory batch");
        Ok(())
    }
}
