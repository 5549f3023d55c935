// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use quizgate::config::Config;
use quizgate::db::{Db, FirestoreDb};
use quizgate::models::{Level, LevelAccess, Question, Role, User};
use quizgate::routes::create_router;
use quizgate::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "secret123";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app over a fresh in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with_config(Config::default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, Db::in_memory()));
    (create_router(state.clone()), state)
}

/// Insert a user directly into the store with password [`PASSWORD`].
#[allow(dead_code)]
pub async fn seed_user(
    state: &AppState,
    username: &str,
    role: Role,
    active: bool,
    level_access: LevelAccess,
) -> User {
    let user = User {
        id: format!("id-{username}"),
        username: username.to_string(),
        password_hash: state.passwords.hash(PASSWORD).await.unwrap(),
        role,
        is_active: active,
        passport_full_name: None,
        passport_number: None,
        level_access,
        created_at: "2026-01-01T00:00:00.000Z".to_string(),
        updated_at: "2026-01-01T00:00:00.000Z".to_string(),
    };
    assert!(state.db.create_user(&user).await.unwrap());
    user
}

/// Full 90-question bank for `level`; question `n` has answer `n % 4`.
#[allow(dead_code)]
pub fn question_bank(level: Level) -> Vec<Question> {
    (1..=90)
        .map(|n| Question {
            id: format!("l{}-q{}", level.number(), n),
            level,
            number: n,
            question: format!("Level {} question {}", level.number(), n),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer_index: n % 4,
        })
        .collect()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

/// Build a request with optional cookie, device header and JSON body.
#[allow(dead_code)]
pub fn request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    device: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if let Some(device) = device {
        builder = builder.header("x-device-id", device);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[allow(dead_code)]
pub async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

/// POST /auth/login and return the raw response.
#[allow(dead_code)]
pub async fn login(app: &Router, username: &str, password: &str, device: Option<&str>) -> Response {
    let mut body = serde_json::json!({ "username": username, "password": password });
    if let Some(device) = device {
        body["deviceId"] = Value::from(device);
    }
    send(app, request("POST", "/auth/login", None, None, Some(body))).await
}

/// A logged-in client: its cookie and the device id it presents.
#[allow(dead_code)]
pub struct Session {
    pub cookie: String,
    pub device_id: String,
}

#[allow(dead_code)]
impl Session {
    pub async fn start(app: &Router, username: &str, device: &str) -> Self {
        let response = login(app, username, PASSWORD, Some(device)).await;
        assert_eq!(response.status(), StatusCode::OK, "login as {username}");
        let token = find_cookie(&set_cookie_headers(&response), "token");
        let cookie = token.split(';').next().unwrap().to_string();
        Self {
            cookie,
            device_id: device.to_string(),
        }
    }

    pub fn get(&self, uri: &str) -> Request<Body> {
        request("GET", uri, Some(&self.cookie), Some(&self.device_id), None)
    }

    pub fn send_json(&self, method: &str, uri: &str, body: Value) -> Request<Body> {
        request(
            method,
            uri,
            Some(&self.cookie),
            Some(&self.device_id),
            Some(body),
        )
    }

    pub fn post_empty(&self, uri: &str) -> Request<Body> {
        request("POST", uri, Some(&self.cookie), Some(&self.device_id), None)
    }

    /// Same session cookie presented from a different device.
    pub fn from_device(&self, device: Option<&str>) -> Self {
        Self {
            cookie: self.cookie.clone(),
            device_id: device.unwrap_or_default().to_string(),
        }
    }
}
