//! Axum server and routes.

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use follow_types::{
    Caller, ErrorResponse, FollowGraph, FollowRequest, IdentityError, IdentityResolver,
    RelationshipError, UserId,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub struct AppState {
    pub graph: Arc<dyn FollowGraph + Send + Sync>,
    pub identity: Arc<dyn IdentityResolver + Send + Sync>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/follow", post(handle_follow))
        .route("/api/unfollow", post(handle_unfollow))
        .route("/api/following/me", get(handle_my_following))
        .route("/api/followers/me", get(handle_my_followers))
        .route("/api/following/:user_id", get(handle_following))
        .route("/api/followers/:user_id", get(handle_followers))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            identity_middleware,
        ));
    Router::new()
        .merge(api)
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Error returned by handlers; maps relationship and identity failures to HTTP statuses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Relationship(#[from] RelationshipError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Relationship(RelationshipError::StoreUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Relationship(RelationshipError::SelfFollowRejected(_))
            | ApiError::Relationship(RelationshipError::InvalidUserId) => StatusCode::BAD_REQUEST,
            ApiError::Identity(IdentityError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Identity(IdentityError::Rejected(code)) => rejected_status(*code),
            ApiError::Identity(IdentityError::MissingCredential) => StatusCode::UNAUTHORIZED,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// Status for a non-success reply from the user service: its own 4xx passes through, a 5xx
/// (or anything unrecognised) is the upstream's failure and becomes 502.
fn rejected_status(code: u16) -> StatusCode {
    match StatusCode::from_u16(code) {
        Ok(status) if status.is_client_error() => status,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Resolves the caller from the `authorization` header and stores it as an `Extension<Caller>`.
async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let authorization = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    match state.identity.resolve(authorization.as_deref()).await {
        Ok(caller) => {
            req.extensions_mut().insert(caller);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, path = %req.uri().path(), "identity resolution failed");
            ApiError::from(e).into_response()
        }
    }
}

async fn handle_follow(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<FollowRequest>,
) -> Result<StatusCode, ApiError> {
    state.graph.follow(&caller.id, &req.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_unfollow(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<FollowRequest>,
) -> Result<StatusCode, ApiError> {
    state.graph.unfollow(&caller.id, &req.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_my_following(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<UserId>>, ApiError> {
    Ok(Json(state.graph.get_following(&caller.id).await?))
}

async fn handle_my_followers(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<UserId>>, ApiError> {
    Ok(Json(state.graph.get_followers(&caller.id).await?))
}

async fn handle_following(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<UserId>>, ApiError> {
    Ok(Json(state.graph.get_following(&UserId::from(user_id)).await?))
}

async fn handle_followers(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<UserId>>, ApiError> {
    Ok(Json(state.graph.get_followers(&UserId::from(user_id)).await?))
}

async fn handle_health() -> &'static str {
    "ok"
}
