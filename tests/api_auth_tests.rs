// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Tokens are accepted from the cookie or a Bearer header
//! 3. Role gates reject the wrong role
//! 4. CORS preflight requests allow the device header

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use quizgate::models::{LevelAccess, Role};
use quizgate::services::Claims;
use std::time::{SystemTime, UNIX_EPOCH};

mod common;
use common::{body_json, request, send, Session};

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Sign claims directly, bypassing the codec.
fn sign(claims: &Claims, key: &[u8]) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(key),
    )
    .unwrap()
}

fn claims_for(sub: &str, iat: u64, exp: u64) -> Claims {
    Claims {
        sub: sub.to_string(),
        username: "alice".to_string(),
        role: Role::User,
        iat,
        exp,
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = common::create_test_app();
    let response = send(&app, request("GET", "/health", None, None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _) = common::create_test_app();

    for uri in ["/auth/me", "/tests/results", "/admin/users"] {
        let response = send(&app, request("GET", uri, None, None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body_json(response).await["error"], "no_token");
    }

    let response = send(&app, request("POST", "/auth/logout", None, None, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_externally_signed_token_accepted() {
    let (app, state) = common::create_test_app();
    let alice = common::seed_user(&state, "alice", Role::User, true, LevelAccess::default()).await;

    let token = sign(
        &claims_for(&alice.id, now(), now() + 3600),
        &state.config.jwt_signing_key,
    );
    let cookie = format!("token={token}");
    let response = send(&app, request("GET", "/auth/me", Some(&cookie), None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_tokens_rejected_alike() {
    let (app, state) = common::create_test_app();
    let alice = common::seed_user(&state, "alice", Role::User, true, LevelAccess::default()).await;
    let key = state.config.jwt_signing_key.clone();

    let expired = sign(&claims_for(&alice.id, now() - 7200, now() - 3600), &key);
    let wrong_key = sign(
        &claims_for(&alice.id, now(), now() + 3600),
        b"another_key_that_is_not_the_server_key",
    );
    let unknown_user = sign(&claims_for("no-such-user", now(), now() + 3600), &key);

    for token in [expired.as_str(), wrong_key.as_str(), unknown_user.as_str(), "not.a.jwt"] {
        let cookie = format!("token={token}");
        let response = send(&app, request("GET", "/auth/me", Some(&cookie), None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{token}");
        assert_eq!(body_json(response).await["error"], "invalid_token");
    }
}

#[tokio::test]
async fn test_bearer_header_fallback() {
    let (app, state) = common::create_test_app();
    let alice = common::seed_user(&state, "alice", Role::User, true, LevelAccess::default()).await;
    let token = state.tokens.issue(&alice).unwrap();

    let response = send(
        &app,
        Request::builder()
            .uri("/auth/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let (app, state) = common::create_test_app();
    common::seed_user(&state, "alice", Role::User, true, LevelAccess::all()).await;
    let session = Session::start(&app, "alice", "dev-1").await;

    let response = send(&app, session.get("/admin/users")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "forbidden");
}

#[tokio::test]
async fn test_cors_preflight_allows_device_header() {
    let (app, _) = common::create_test_app();

    let response = send(
        &app,
        Request::builder()
            .method("OPTIONS")
            .uri("/auth/me")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-device-id")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
    let allowed = headers
        .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(allowed.contains("x-device-id"), "{allowed}");
}

#[tokio::test]
async fn test_cors_rejects_unknown_origin() {
    let (app, _) = common::create_test_app();

    let response = send(
        &app,
        Request::builder()
            .method("OPTIONS")
            .uri("/auth/me")
            .header(header::ORIGIN, "https://evil.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
