// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin user management routes. Mounted behind the access gate and the admin
//! role gate.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::extract::ValidatedJson;
use crate::models::UserSummary;
use crate::services::{LevelAccessUpdate, NewUser, UserUpdate};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/users", get(list_users).post(create_user))
        .route("/admin/users/{id}", put(update_user).delete(delete_user))
        .route("/admin/users/{id}/reset-device", post(reset_device))
        .route("/admin/users/{id}/level-access", put(update_level_access))
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub message: &'static str,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<NewUser>,
) -> Result<(StatusCode, Json<UserEnvelope>)> {
    let user = state.users.create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            message: "User created successfully",
            user: user.summary(),
        }),
    ))
}

async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<UsersResponse>> {
    let users = state.users.list().await?;
    Ok(Json(UsersResponse {
        users: users.iter().map(|u| u.summary()).collect(),
    }))
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UserUpdate>,
) -> Result<Json<UserEnvelope>> {
    let user = state.users.update(&id, req).await?;
    Ok(Json(UserEnvelope {
        message: "User updated successfully",
        user: user.summary(),
    }))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.users.delete(&id).await?;
    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}

async fn reset_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserEnvelope>> {
    let user = state.sessions.force_reset_device(&id).await?;
    Ok(Json(UserEnvelope {
        message: "Device session reset successfully",
        user: user.summary(),
    }))
}

async fn update_level_access(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<LevelAccessUpdate>,
) -> Result<Json<UserEnvelope>> {
    let user = state.users.set_level_access(&id, req).await?;
    Ok(Json(UserEnvelope {
        message: "Level access updated successfully",
        user: user.summary(),
    }))
}
