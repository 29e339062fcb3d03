//! Identity, edge and set-operation types plus the HTTP request/response DTOs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user identifier issued by the identity service. Only compared and hashed, never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Directed follow relationship. Never stored as a record: it exists as one member in the
/// follower's following set and one in the followee's followers set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FollowEdge {
    pub follower: UserId,
    pub followee: UserId,
}

impl FollowEdge {
    pub fn new(follower: impl Into<UserId>, followee: impl Into<UserId>) -> Self {
        Self {
            follower: follower.into(),
            followee: followee.into(),
        }
    }

    pub fn is_self_follow(&self) -> bool {
        self.follower == self.followee
    }

    /// The two set mutations that add this edge.
    pub fn add_ops(&self) -> [SetOp; 2] {
        [
            SetOp::Add {
                key: SetRole::Following.key_for(&self.follower),
                member: self.followee.as_str().to_string(),
            },
            SetOp::Add {
                key: SetRole::Followers.key_for(&self.followee),
                member: self.follower.as_str().to_string(),
            },
        ]
    }

    /// The two set mutations that remove this edge.
    pub fn remove_ops(&self) -> [SetOp; 2] {
        [
            SetOp::Remove {
                key: SetRole::Following.key_for(&self.follower),
                member: self.followee.as_str().to_string(),
            },
            SetOp::Remove {
                key: SetRole::Followers.key_for(&self.followee),
                member: self.follower.as_str().to_string(),
            },
        ]
    }
}

/// Which per-user set a key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetRole {
    /// Users that the owner follows.
    Following,
    /// Users that follow the owner.
    Followers,
}

impl SetRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetRole::Following => "following",
            SetRole::Followers => "followers",
        }
    }

    /// Store key for this role and user: `<role>:<user>`.
    pub fn key_for(&self, user: &UserId) -> String {
        format!("{}:{}", self.as_str(), user.as_str())
    }
}

/// Single set mutation applied inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOp {
    Add { key: String, member: String },
    Remove { key: String, member: String },
}

impl SetOp {
    pub fn key(&self) -> &str {
        match self {
            SetOp::Add { key, .. } | SetOp::Remove { key, .. } => key,
        }
    }

    pub fn member(&self) -> &str {
        match self {
            SetOp::Add { member, .. } | SetOp::Remove { member, .. } => member,
        }
    }
}

/// Authenticated caller as returned by the user service's `/api/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
}

impl Caller {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self { id: id.into() }
    }
}

/// Body of `POST /api/follow` and `POST /api/unfollow`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowRequest {
    #[serde(rename = "userId")]
    pub user_id: UserId,
}

/// Error body returned by the HTTP layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_keys_are_distinct_per_role() {
        let u = UserId::from("u1");
        assert_eq!(SetRole::Following.key_for(&u), "following:u1");
        assert_eq!(SetRole::Followers.key_for(&u), "followers:u1");
    }

    #[test]
    fn edge_ops_mirror_each_other() {
        let edge = FollowEdge::new("a", "b");
        let [fwd, rev] = edge.add_ops();
        assert_eq!(fwd.key(), "following:a");
        assert_eq!(fwd.member(), "b");
        assert_eq!(rev.key(), "followers:b");
        assert_eq!(rev.member(), "a");
        assert!(matches!(edge.remove_ops()[0], SetOp::Remove { .. }));
    }

    #[test]
    fn caller_accepts_mongo_style_id() {
        let c: Caller = serde_json::from_str(r#"{"_id":"abc","username":"alice"}"#).unwrap();
        assert_eq!(c.id.as_str(), "abc");
        let c: Caller = serde_json::from_str(r#"{"id":"xyz"}"#).unwrap();
        assert_eq!(c.id.as_str(), "xyz");
    }

    #[test]
    fn follow_request_uses_camel_case_field() {
        let r: FollowRequest = serde_json::from_str(r#"{"userId":"u2"}"#).unwrap();
        assert_eq!(r.user_id, UserId::from("u2"));
        assert!(UserId::from("  ").is_blank());
    }
}
