//! Relationship index: the follow graph stored as two mirrored set families.

mod index;
pub use follow_types::{FollowGraph, RelationshipError, UserId};
pub use index::{RelationshipIndex, SelfFollowPolicy};
