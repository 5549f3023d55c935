// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session routes: login, logout and current identity.

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::config::Config;
use crate::error::Result;
use crate::extract::ValidatedJson;
use crate::middleware::auth::{AuthUser, DEVICE_HEADER, TOKEN_COOKIE};
use crate::models::UserSummary;
use crate::AppState;

/// Session cookie lifetime. Fixed, independent of the token lifetime.
const SESSION_COOKIE_MAX_AGE: time::Duration = time::Duration::days(7);

/// Routes reachable without a session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/login", post(login))
}

/// Routes that sit behind the access gate.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(max = 128))]
    pub device_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: UserSummary,
    pub device_id: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserSummary,
}

/// Session cookie with the attributes shared by creation and removal.
fn session_cookie(config: &Config, value: String) -> Cookie<'static> {
    let (secure, same_site) = if config.is_production() {
        (true, SameSite::None)
    } else {
        (false, SameSite::Lax)
    };

    Cookie::build((TOKEN_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(same_site)
        .build()
}

/// Authenticate and bind the presenting device.
///
/// The device id is taken from the body, falling back to the device header.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let header_device = headers.get(DEVICE_HEADER).and_then(|h| h.to_str().ok());
    let presented = req
        .device_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .or(header_device);

    let outcome = state
        .sessions
        .login(req.username.trim(), &req.password, presented)
        .await?;

    let mut cookie = session_cookie(&state.config, outcome.token);
    cookie.set_max_age(SESSION_COOKIE_MAX_AGE);

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: "Login successful",
            user: outcome.user,
            device_id: outcome.device_id,
        }),
    ))
}

/// Release the device slot and drop the cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>)> {
    state.sessions.logout(user.id()).await?;

    let jar = jar.remove(session_cookie(&state.config, String::new()));
    Ok((
        jar,
        Json(MessageResponse {
            message: "Logout successful",
        }),
    ))
}

async fn me(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse { user: user.profile })
}
