// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access gate: session token + device binding check on every request.

use crate::error::AppError;
use crate::models::{Role, UserSummary};
use crate::services::device;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Session cookie name.
pub const TOKEN_COOKIE: &str = "token";

/// Header carrying the client's device id.
pub const DEVICE_HEADER: &str = "x-device-id";

/// Authenticated identity attached to the request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub profile: UserSummary,
    /// Device id presented with this request, if any
    pub device_id: Option<String>,
}

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.profile.id
    }
}

/// Resolve a token and presented device id into an identity.
///
/// Read-only: nothing is written to the store.
pub async fn authenticate(
    state: &AppState,
    token: Option<&str>,
    device_header: Option<&str>,
) -> Result<AuthUser, AppError> {
    let token = token.ok_or(AppError::NoToken)?;

    let claims = state.tokens.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Token rejected");
        AppError::InvalidToken
    })?;

    // Unknown subject looks exactly like a bad token.
    let user = state
        .db
        .get_user(&claims.sub)
        .await?
        .ok_or(AppError::InvalidToken)?;

    if !user.is_active {
        return Err(AppError::AccountDisabled);
    }

    let presented = device::normalize(device_header);
    let binding = state.db.get_binding(&user.id).await?;
    device::evaluate(binding.device_id.as_deref(), presented)
        .into_result()
        .inspect_err(|e| tracing::debug!(user_id = %user.id, error = %e, "Device check failed"))?;

    Ok(AuthUser {
        profile: user.summary(),
        device_id: presented.map(str::to_string),
    })
}

/// Middleware that requires a valid session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = match jar.get(TOKEN_COOKIE) {
        Some(cookie) => Some(cookie.value().to_string()),
        None => request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string),
    };

    let device_header = request
        .headers()
        .get(DEVICE_HEADER)
        .and_then(|h| h.to_str().ok());

    let auth_user = authenticate(&state, token.as_deref(), device_header).await?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

fn require_role(request: &Request, role: Role) -> Result<(), AppError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AppError::NoToken)?;

    if auth_user.profile.role != role {
        tracing::debug!(user_id = %auth_user.id(), required = role.as_str(), "Role check failed");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Admin-only gate. Layer inside [`require_auth`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    require_role(&request, Role::Admin)?;
    Ok(next.run(request).await)
}

/// Regular-user-only gate. Layer inside [`require_auth`].
///
/// For routes admins must not reach. The quiz routes leave it off because
/// admins take tests too and bypass level entitlements instead.
pub async fn require_user(request: Request, next: Next) -> Result<Response, AppError> {
    require_role(&request, Role::User)?;
    Ok(next.run(request).await)
}
