//! Static identity resolver for tests: bearer tokens map to fixed user ids, no network.

use follow_types::{Caller, IdentityError, IdentityResolver};
use std::collections::HashMap;

/// Resolver backed by a fixed `token -> user id` table.
#[derive(Default)]
pub struct StaticIdentityResolver {
    tokens: HashMap<String, String>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `Bearer <token>` as identifying `user_id`.
    pub fn with_token(mut self, token: &str, user_id: &str) -> Self {
        self.tokens.insert(token.to_string(), user_id.to_string());
        self
    }
}

#[async_trait::async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve(&self, authorization: Option<&str>) -> Result<Caller, IdentityError> {
        let header = authorization.ok_or(IdentityError::MissingCredential)?;
        let token = header.strip_prefix("Bearer ").unwrap_or(header);
        self.tokens
            .get(token)
            .map(|id| Caller::new(id.as_str()))
            .ok_or(IdentityError::Rejected(401))
    }
}
