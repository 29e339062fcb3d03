//! Traits for the set store, the relationship index, and identity resolution.

use crate::{Caller, SetOp, UserId};
use async_trait::async_trait;

/// Key-value store with named string sets and an atomic multi-op batch.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Add a member to a set. Returns true when the member was not already present.
    async fn set_add(&self, key: &str, member: &str) -> Result<bool, KvStoreError>;

    /// Remove a member from a set. Returns true when the member was present.
    async fn set_remove(&self, key: &str, member: &str) -> Result<bool, KvStoreError>;

    /// Current members of a set; an absent key yields an empty vec.
    async fn set_members(&self, key: &str) -> Result<Vec<String>, KvStoreError>;

    /// Apply all ops as one unit: either every op is visible afterwards or none is.
    async fn atomic_batch(&self, ops: &[SetOp]) -> Result<(), KvStoreError>;
}

/// Follow graph operations exposed to the HTTP layer.
#[async_trait]
pub trait FollowGraph: Send + Sync {
    async fn follow(&self, follower: &UserId, followee: &UserId) -> Result<(), RelationshipError>;

    async fn unfollow(&self, follower: &UserId, followee: &UserId)
        -> Result<(), RelationshipError>;

    async fn get_following(&self, user: &UserId) -> Result<Vec<UserId>, RelationshipError>;

    async fn get_followers(&self, user: &UserId) -> Result<Vec<UserId>, RelationshipError>;
}

/// Resolves the caller of an inbound request from its `authorization` header value.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, authorization: Option<&str>) -> Result<Caller, IdentityError>;
}

#[derive(Debug, thiserror::Error)]
pub enum KvStoreError {
    #[error("kv store unavailable: {0}")]
    Unavailable(String),
    #[error("kv batch failed to commit: {0}")]
    BatchFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RelationshipError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] KvStoreError),
    #[error("user {0} cannot follow themselves")]
    SelfFollowRejected(UserId),
    #[error("user id must not be blank")]
    InvalidUserId,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("missing authorization header")]
    MissingCredential,
    #[error("identity service rejected credential: {0}")]
    Rejected(u16),
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}
