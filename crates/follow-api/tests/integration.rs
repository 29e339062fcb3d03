//! Integration tests: follow/unfollow round trips, identity handling, error statuses.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use follow_api::server::{self, AppState};
use follow_identity::StaticIdentityResolver;
use follow_index::{RelationshipIndex, SelfFollowPolicy};
use follow_kv::InMemoryKvStore;
use http_body_util::BodyExt;
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;

type Index = RelationshipIndex<InMemoryKvStore>;

fn test_app_with(policy: SelfFollowPolicy) -> (axum::Router, Arc<Index>) {
    let index = Arc::new(
        RelationshipIndex::new(InMemoryKvStore::new()).with_self_follow_policy(policy),
    );
    let identity = StaticIdentityResolver::new()
        .with_token("t1", "u1")
        .with_token("t2", "u2")
        .with_token("t3", "u3");
    let state = Arc::new(AppState {
        graph: index.clone(),
        identity: Arc::new(identity),
    });
    (server::router(state), index)
}

fn test_app() -> (axum::Router, Arc<Index>) {
    test_app_with(SelfFollowPolicy::Permit)
}

fn post_as(token: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_as(token: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn ids(app: &axum::Router, req: Request<Body>) -> Vec<String> {
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    let mut v: Vec<String> = serde_json::from_slice(&body).unwrap();
    v.sort();
    v
}

async fn status_of(app: &axum::Router, req: Request<Body>) -> StatusCode {
    app.clone().oneshot(req).await.unwrap().status()
}

#[tokio::test]
async fn follow_then_list_both_directions() {
    let (app, _) = test_app();
    let status = status_of(&app, post_as("t1", "/api/follow", json!({ "userId": "u2" }))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(ids(&app, get_as("t1", "/api/following/me")).await, vec!["u2"]);
    assert_eq!(ids(&app, get_as("t2", "/api/followers/me")).await, vec!["u1"]);
    assert_eq!(ids(&app, get_as("t3", "/api/followers/u2")).await, vec!["u1"]);
    assert!(ids(&app, get_as("t3", "/api/following/u2")).await.is_empty());

    status_of(&app, post_as("t1", "/api/follow", json!({ "userId": "u3" }))).await;
    assert_eq!(
        ids(&app, get_as("t2", "/api/following/u1")).await,
        vec!["u2", "u3"]
    );

    let status = status_of(&app, post_as("t1", "/api/unfollow", json!({ "userId": "u2" }))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(ids(&app, get_as("t1", "/api/following/me")).await, vec!["u3"]);
    assert!(ids(&app, get_as("t1", "/api/followers/u2")).await.is_empty());
}

#[tokio::test]
async fn repeated_follow_and_missing_unfollow_are_no_ops() {
    let (app, _) = test_app();
    for _ in 0..3 {
        let s = status_of(&app, post_as("t1", "/api/follow", json!({ "userId": "u2" }))).await;
        assert_eq!(s, StatusCode::NO_CONTENT);
    }
    assert_eq!(ids(&app, get_as("t1", "/api/following/me")).await, vec!["u2"]);

    let s = status_of(&app, post_as("t1", "/api/unfollow", json!({ "userId": "u3" }))).await;
    assert_eq!(s, StatusCode::NO_CONTENT);
    assert_eq!(ids(&app, get_as("t1", "/api/following/me")).await, vec!["u2"]);
}

#[tokio::test]
async fn unknown_user_lists_are_empty() {
    let (app, _) = test_app();
    assert!(ids(&app, get_as("t1", "/api/following/nobody")).await.is_empty());
    assert!(ids(&app, get_as("t1", "/api/followers/nobody")).await.is_empty());
}

#[tokio::test]
async fn requests_without_identity_are_unauthorized() {
    let (app, index) = test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/api/follow")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "userId": "u2" }).to_string()))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    let j: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(j["error"].as_str().unwrap().contains("authorization"));

    let s = status_of(&app, get_as("bogus", "/api/following/me")).await;
    assert_eq!(s, StatusCode::UNAUTHORIZED);
    assert!(index.store().is_empty().await);
}

#[tokio::test]
async fn health_needs_no_identity() {
    let (app, _) = test_app();
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn self_follow_follows_configured_policy() {
    let (app, _) = test_app();
    let s = status_of(&app, post_as("t1", "/api/follow", json!({ "userId": "u1" }))).await;
    assert_eq!(s, StatusCode::NO_CONTENT);
    assert_eq!(ids(&app, get_as("t1", "/api/followers/me")).await, vec!["u1"]);

    let (app, index) = test_app_with(SelfFollowPolicy::Reject);
    let res = app
        .clone()
        .oneshot(post_as("t1", "/api/follow", json!({ "userId": "u1" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    let j: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(j["error"].as_str().unwrap().contains("u1"));
    assert!(index.store().is_empty().await);
}

#[tokio::test]
async fn store_outage_maps_to_service_unavailable() {
    let (app, index) = test_app();
    index.store().set_available(false);
    let s = status_of(&app, post_as("t1", "/api/follow", json!({ "userId": "u2" }))).await;
    assert_eq!(s, StatusCode::SERVICE_UNAVAILABLE);
    let s = status_of(&app, get_as("t1", "/api/followers/me")).await;
    assert_eq!(s, StatusCode::SERVICE_UNAVAILABLE);

    index.store().set_available(true);
    assert!(ids(&app, get_as("t1", "/api/following/me")).await.is_empty());
}

#[tokio::test]
async fn malformed_bodies_are_client_errors() {
    let (app, _) = test_app();
    let s = status_of(&app, post_as("t1", "/api/follow", json!({}))).await;
    assert!(s.is_client_error());
    let s = status_of(&app, post_as("t1", "/api/follow", json!({ "userId": "" }))).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn concurrent_follow_requests_store_one_edge() {
    let (app, _) = test_app();
    let mut handles = Vec::new();
    for _ in 0..32 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.oneshot(post_as("t2", "/api/follow", json!({ "userId": "u3" })))
                .await
                .unwrap()
                .status()
        }));
    }
    for h in handles {
        assert_eq!(h.await.unwrap(), StatusCode::NO_CONTENT);
    }
    assert_eq!(ids(&app, get_as("t2", "/api/following/me")).await, vec!["u3"]);
    assert_eq!(ids(&app, get_as("t3", "/api/followers/me")).await, vec!["u2"]);
}
