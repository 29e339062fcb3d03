//! RelationshipIndex: follow, unfollow and both listing directions over a KeyValueStore.
//!
//! Every edge lives in two places: `following:<follower>` holds the followee and
//! `followers:<followee>` holds the follower. Mutations write both through one
//! `atomic_batch` so no reader can see one side without the other.

use async_trait::async_trait;
use follow_kv::KeyValueStore;
use follow_types::{FollowEdge, FollowGraph, RelationshipError, SetRole, UserId};
use std::str::FromStr;

/// What `follow(a, a)` does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelfFollowPolicy {
    /// A user may follow themselves; the edge is stored like any other.
    #[default]
    Permit,
    /// `follow(a, a)` fails with `SelfFollowRejected` and touches nothing.
    Reject,
}

impl FromStr for SelfFollowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permit" | "allow" => Ok(SelfFollowPolicy::Permit),
            "reject" | "deny" => Ok(SelfFollowPolicy::Reject),
            other => Err(format!("unknown self-follow policy: {}", other)),
        }
    }
}

/// Follow graph over a set store. Holds no graph state of its own; every read goes to the store.
pub struct RelationshipIndex<S> {
    store: S,
    self_follow: SelfFollowPolicy,
}

impl<S> RelationshipIndex<S>
where
    S: KeyValueStore + Send + Sync,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            self_follow: SelfFollowPolicy::default(),
        }
    }

    pub fn with_self_follow_policy(mut self, policy: SelfFollowPolicy) -> Self {
        self.self_follow = policy;
        self
    }

    pub fn self_follow_policy(&self) -> SelfFollowPolicy {
        self.self_follow
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// True when `follower` currently follows `followee`.
    pub async fn is_following(
        &self,
        follower: &UserId,
        followee: &UserId,
    ) -> Result<bool, RelationshipError> {
        let following = self.get_following(follower).await?;
        Ok(following.contains(followee))
    }

    fn edge(follower: &UserId, followee: &UserId) -> Result<FollowEdge, RelationshipError> {
        if follower.is_blank() || followee.is_blank() {
            return Err(RelationshipError::InvalidUserId);
        }
        Ok(FollowEdge::new(follower.clone(), followee.clone()))
    }

    async fn members(&self, role: SetRole, user: &UserId) -> Result<Vec<UserId>, RelationshipError> {
        let key = role.key_for(user);
        let members = self.store.set_members(&key).await.map_err(|e| {
            tracing::warn!(key = %key, error = %e, "set read failed");
            RelationshipError::from(e)
        })?;
        Ok(members.into_iter().map(UserId::from).collect())
    }
}

#[async_trait]
impl<S> FollowGraph for RelationshipIndex<S>
where
    S: KeyValueStore + Send + Sync,
{
    async fn follow(&self, follower: &UserId, followee: &UserId) -> Result<(), RelationshipError> {
        let edge = Self::edge(follower, followee)?;
        if edge.is_self_follow() && self.self_follow == SelfFollowPolicy::Reject {
            return Err(RelationshipError::SelfFollowRejected(edge.follower));
        }
        self.store.atomic_batch(&edge.add_ops()).await.map_err(|e| {
            tracing::warn!(follower = %follower, followee = %followee, error = %e, "follow failed");
            RelationshipError::from(e)
        })?;
        tracing::debug!(follower = %follower, followee = %followee, "follow");
        Ok(())
    }

    async fn unfollow(
        &self,
        follower: &UserId,
        followee: &UserId,
    ) -> Result<(), RelationshipError> {
        let edge = Self::edge(follower, followee)?;
        self.store.atomic_batch(&edge.remove_ops()).await.map_err(|e| {
            tracing::warn!(follower = %follower, followee = %followee, error = %e, "unfollow failed");
            RelationshipError::from(e)
        })?;
        tracing::debug!(follower = %follower, followee = %followee, "unfollow");
        Ok(())
    }

    async fn get_following(&self, user: &UserId) -> Result<Vec<UserId>, RelationshipError> {
        self.members(SetRole::Following, user).await
    }

    async fn get_followers(&self, user: &UserId) -> Result<Vec<UserId>, RelationshipError> {
        self.members(SetRole::Followers, user).await
    }
}
