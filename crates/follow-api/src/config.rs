//! Service configuration read from environment variables.

use follow_index::SelfFollowPolicy;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_LISTEN: &str = "0.0.0.0:3003";
const DEFAULT_USER_SERVICE: &str = "http://localhost:3001";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid FOLLOW_LISTEN address {0:?}: {1}")]
    InvalidListen(String, std::net::AddrParseError),
    #[error("invalid FOLLOW_SELF_FOLLOW: {0}")]
    InvalidSelfFollow(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// `FOLLOW_LISTEN`
    pub listen: SocketAddr,
    /// `USER_MICROSERVICE_BASE_URL`
    pub user_service_url: String,
    /// `FOLLOW_REDIS_URL`: Redis server holding the sets. Takes precedence over `store_path`.
    pub redis_url: Option<String>,
    /// `FOLLOW_STORE_PATH`: SQLite file for the set store. Unset (with no Redis) means in-memory.
    pub store_path: Option<PathBuf>,
    /// `FOLLOW_SELF_FOLLOW`: `permit` or `reject`.
    pub self_follow: SelfFollowPolicy,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary variable source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

        let listen_raw = get("FOLLOW_LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen: SocketAddr = listen_raw
            .parse()
            .map_err(|e| ConfigError::InvalidListen(listen_raw.clone(), e))?;
        let self_follow = match get("FOLLOW_SELF_FOLLOW") {
            Some(v) => v.parse::<SelfFollowPolicy>().map_err(ConfigError::InvalidSelfFollow)?,
            None => SelfFollowPolicy::default(),
        };

        Ok(Self {
            listen,
            user_service_url: get("USER_MICROSERVICE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_USER_SERVICE.to_string()),
            redis_url: get("FOLLOW_REDIS_URL"),
            store_path: get("FOLLOW_STORE_PATH").map(PathBuf::from),
            self_follow,
        })
    }
}
