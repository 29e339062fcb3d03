//! Follow service REST API: /api/follow, /api/unfollow, /api/following, /api/followers.

use follow_api::config::ServiceConfig;
use follow_api::server::{self, AppState};
use follow_identity::HttpIdentityResolver;
use follow_index::RelationshipIndex;
use follow_kv::{InMemoryKvStore, KeyValueStore};
use follow_types::FollowGraph;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type SharedGraph = Arc<dyn FollowGraph + Send + Sync>;
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env()?;
    let graph = build_graph(&config).await?;
    let identity = Arc::new(HttpIdentityResolver::new(&config.user_service_url));
    let state = Arc::new(AppState { graph, identity });

    let app = server::router(state);
    tracing::info!(
        user_service = %config.user_service_url,
        self_follow = ?config.self_follow,
        "follow API listening on {}",
        config.listen
    );
    axum::serve(
        tokio::net::TcpListener::bind(config.listen).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}

/// Redis when `FOLLOW_REDIS_URL` is set, then SQLite for `FOLLOW_STORE_PATH`, else in-memory.
async fn build_graph(config: &ServiceConfig) -> Result<SharedGraph, BoxError> {
    if let Some(graph) = redis_graph(config).await? {
        return Ok(graph);
    }
    if let Some(graph) = sqlite_graph(config)? {
        return Ok(graph);
    }
    tracing::info!("using in-memory set store");
    Ok(index_over(InMemoryKvStore::new(), config))
}

fn index_over<S>(store: S, config: &ServiceConfig) -> SharedGraph
where
    S: KeyValueStore + Send + Sync + 'static,
{
    Arc::new(RelationshipIndex::new(store).with_self_follow_policy(config.self_follow))
}

#[cfg(feature = "redis")]
async fn redis_graph(config: &ServiceConfig) -> Result<Option<SharedGraph>, BoxError> {
    let Some(url) = &config.redis_url else {
        return Ok(None);
    };
    tracing::info!("using redis set store");
    let store = follow_kv::RedisKvStore::connect(url).await?;
    Ok(Some(index_over(store, config)))
}

#[cfg(not(feature = "redis"))]
async fn redis_graph(config: &ServiceConfig) -> Result<Option<SharedGraph>, BoxError> {
    if config.redis_url.is_some() {
        tracing::warn!("FOLLOW_REDIS_URL ignored: built without the redis feature");
    }
    Ok(None)
}

#[cfg(feature = "sqlite")]
fn sqlite_graph(config: &ServiceConfig) -> Result<Option<SharedGraph>, BoxError> {
    let Some(path) = &config.store_path else {
        return Ok(None);
    };
    tracing::info!(path = %path.display(), "using sqlite set store");
    let store = follow_kv::SqliteKvStore::new(path)?;
    Ok(Some(index_over(store, config)))
}

#[cfg(not(feature = "sqlite"))]
fn sqlite_graph(config: &ServiceConfig) -> Result<Option<SharedGraph>, BoxError> {
    if config.store_path.is_some() {
        tracing::warn!("FOLLOW_STORE_PATH ignored: built without the sqlite feature");
    }
    Ok(None)
}
