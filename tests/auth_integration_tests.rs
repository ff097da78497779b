mod common;

use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use common::*;
use hr_portal::{
    auth::{AuthProvider, AuthSession, SESSION_COOKIE},
    config::Env,
};
use std::collections::BTreeSet;
use uuid::Uuid;

// --- Helper Functions ---

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn roles(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|r| r.to_string()).collect()
}

async fn resolve(env: Env, initialized: bool, parts: &mut Parts) -> AuthSession {
    let app_state = create_app_state(env, true, initialized);
    // The extractor never rejects.
    AuthSession::from_request_parts(parts, &app_state).await.unwrap()
}

// --- Tests ---

#[tokio::test]
async fn test_session_from_bearer_token() {
    let token = create_token(&["hr"]);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let session = resolve(Env::Production, true, &mut parts).await;

    assert!(session.initialized());
    assert!(session.authenticated());
    assert_eq!(session.principal().unwrap().id, TEST_USER_ID);
    assert!(session.has_any_role(&roles(&["admin", "hr"])));
    assert!(!session.has_any_role(&roles(&["admin"])));
}

#[tokio::test]
async fn test_session_from_cookie() {
    let token = create_token(&["admin"]);
    let mut parts = get_request_parts(Method::GET, "/dashboard".parse().unwrap());
    parts.headers.insert(
        header::COOKIE,
        header::HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE, token)).unwrap(),
    );

    let session = resolve(Env::Production, true, &mut parts).await;

    assert!(session.authenticated());
    assert!(session.has_any_role(&roles(&["admin"])));
}

#[tokio::test]
async fn test_session_falls_back_to_cookie_after_rejected_bearer() {
    let mut parts = get_request_parts(Method::GET, "/dashboard".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_static("Bearer stale-or-foreign-token"),
    );
    parts.headers.insert(
        header::COOKIE,
        header::HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, create_token(&["hr"]))).unwrap(),
    );

    let session = resolve(Env::Production, true, &mut parts).await;

    assert!(session.authenticated());
    assert!(session.has_any_role(&roles(&["hr"])));
}

#[tokio::test]
async fn test_session_missing_token_is_anonymous() {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let session = resolve(Env::Production, true, &mut parts).await;

    assert!(session.initialized());
    assert!(!session.authenticated());
    assert!(session.principal().is_none());
}

#[tokio::test]
async fn test_session_with_expired_token_is_anonymous() {
    let token = sign(&claims(TEST_USER_ID, &["admin"], now() - 3600), TEST_JWT_SECRET);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let session = resolve(Env::Production, true, &mut parts).await;

    assert!(!session.authenticated());
    assert!(!session.has_any_role(&roles(&["admin"])));
}

#[tokio::test]
async fn test_session_pending_before_initialization() {
    let token = create_token(&["admin"]);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let session = resolve(Env::Production, false, &mut parts).await;

    assert!(!session.initialized());
    assert!(!session.authenticated());
}

#[tokio::test]
async fn test_local_bypass_success() {
    let mock_user_id = Uuid::new_v4();
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&mock_user_id.to_string()).unwrap(),
    );
    parts.headers.insert(
        header::HeaderName::from_static("x-user-roles"),
        header::HeaderValue::from_static("admin, hr"),
    );

    let session = resolve(Env::Local, true, &mut parts).await;

    let principal = session.principal().unwrap();
    assert_eq!(principal.id, mock_user_id);
    assert_eq!(principal.roles, roles(&["admin", "hr"]));
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap(),
    );

    let session = resolve(Env::Production, true, &mut parts).await;

    assert!(!session.authenticated());
}

#[tokio::test]
async fn test_local_bypass_ignored_while_pending() {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap(),
    );

    let session = resolve(Env::Local, false, &mut parts).await;

    assert!(!session.initialized());
    assert!(!session.authenticated());
}

#[tokio::test]
async fn test_local_bypass_with_bad_uuid_falls_through() {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_static("not-a-uuid"),
    );

    let session = resolve(Env::Local, true, &mut parts).await;

    assert!(!session.authenticated());
}

#[tokio::test]
async fn test_state_reflects_provider_view() {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    let session = resolve(Env::Production, true, &mut parts).await;

    let state = session.state();
    assert!(state.initialized);
    assert!(!state.authenticated);
}
