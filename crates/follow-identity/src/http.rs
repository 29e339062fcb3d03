//! HTTP client for the user service: `GET {base}/api/me` with the caller's authorization header.

use follow_types::{Caller, IdentityError, IdentityResolver};

/// Resolves callers by forwarding their credential to the user service.
pub struct HttpIdentityResolver {
    client: reqwest::Client,
    me_url: String,
}

impl HttpIdentityResolver {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            me_url: format!("{}/api/me", base_url.trim_end_matches('/')),
        }
    }

    pub fn me_url(&self) -> &str {
        &self.me_url
    }
}

#[async_trait::async_trait]
impl IdentityResolver for HttpIdentityResolver {
    async fn resolve(&self, authorization: Option<&str>) -> Result<Caller, IdentityError> {
        let authorization = authorization
            .filter(|v| !v.trim().is_empty())
            .ok_or(IdentityError::MissingCredential)?;
        let res = self
            .client
            .get(&self.me_url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            tracing::debug!(status = %status, "user service rejected credential");
            return Err(IdentityError::Rejected(status.as_u16()));
        }
        let body = res
            .text()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        serde_json::from_str(&body)
            .map_err(|e| IdentityError::Unavailable(format!("invalid /api/me response: {}", e)))
    }
}
