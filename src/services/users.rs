// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Administrative user management.

use serde::Deserialize;
use validator::Validate;

use crate::db::Db;
use crate::error::AppError;
use crate::id_utils::new_record_id;
use crate::models::{Level, LevelAccess, Role, User};
use crate::services::PasswordHasher;
use crate::time_utils::now_rfc3339;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;

/// Request to create an account.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: Role,
    #[validate(length(max = 200))]
    pub passport_full_name: Option<String>,
    #[validate(length(max = 100))]
    pub passport_number: Option<String>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    #[validate(length(max = 200))]
    pub passport_full_name: Option<String>,
    #[validate(length(max = 100))]
    pub passport_number: Option<String>,
}

/// Per-level entitlement changes; at least one must be present.
#[derive(Debug, Clone, Copy, Default, Deserialize, Validate)]
pub struct LevelAccessUpdate {
    pub level1: Option<bool>,
    pub level2: Option<bool>,
    pub level3: Option<bool>,
}

impl LevelAccessUpdate {
    fn changes(&self) -> impl Iterator<Item = (Level, bool)> {
        Level::ALL
            .into_iter()
            .zip([self.level1, self.level2, self.level3])
            .filter_map(|(level, value)| value.map(|v| (level, v)))
    }
}

#[derive(Clone)]
pub struct UserService {
    db: Db,
    passwords: PasswordHasher,
}

impl UserService {
    pub fn new(db: Db, passwords: PasswordHasher) -> Self {
        Self { db, passwords }
    }

    pub async fn create(&self, req: NewUser) -> Result<User, AppError> {
        let username = normalize_username(&req.username)?;
        if self.db.username_exists(&username).await? {
            return Err(username_taken());
        }

        let now = now_rfc3339();
        let user = User {
            id: new_record_id()?,
            username,
            password_hash: self.passwords.hash(&req.password).await?,
            role: req.role,
            is_active: true,
            passport_full_name: trimmed(req.passport_full_name),
            passport_number: trimmed(req.passport_number),
            level_access: LevelAccess::default(),
            created_at: now.clone(),
            updated_at: now,
        };

        // The store re-checks uniqueness atomically.
        if !self.db.create_user(&user).await? {
            return Err(username_taken());
        }

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "User created");
        Ok(user)
    }

    /// All users, newest first.
    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        self.db.list_users().await
    }

    pub async fn update(&self, id: &str, req: UserUpdate) -> Result<User, AppError> {
        let mut user = self.find(id).await?;

        if let Some(username) = req.username.as_deref() {
            user.username = normalize_username(username)?;
        }
        if let Some(password) = req.password.as_deref() {
            user.password_hash = self.passwords.hash(password).await?;
        }
        if let Some(role) = req.role {
            user.role = role;
        }
        if let Some(active) = req.is_active {
            user.is_active = active;
        }
        if req.passport_full_name.is_some() {
            user.passport_full_name = trimmed(req.passport_full_name);
        }
        if req.passport_number.is_some() {
            user.passport_number = trimmed(req.passport_number);
        }
        user.updated_at = now_rfc3339();

        if !self.db.update_user(&user).await? {
            return Err(username_taken());
        }

        tracing::info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// Remove a user along with their device binding and results.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if !self.db.delete_user(id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    pub async fn set_level_access(
        &self,
        id: &str,
        req: LevelAccessUpdate,
    ) -> Result<User, AppError> {
        if req.changes().next().is_none() {
            return Err(AppError::BadRequest(
                "No level access updates provided".to_string(),
            ));
        }

        let mut user = self.find(id).await?;
        for (level, allowed) in req.changes() {
            user.level_access.set(level, allowed);
        }
        user.updated_at = now_rfc3339();

        if !self.db.update_user(&user).await? {
            return Err(username_taken());
        }

        tracing::info!(user_id = %user.id, "Level access updated");
        Ok(user)
    }

    /// Create the bootstrap admin unless the username already exists.
    ///
    /// Returns whether an account was created. An existing account is never
    /// modified.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, AppError> {
        let username = normalize_username(username)?;
        if self.db.username_exists(&username).await? {
            tracing::debug!(username = %username, "Bootstrap admin already exists");
            return Ok(false);
        }

        let mut admin = self
            .create(NewUser {
                username,
                password: password.to_string(),
                role: Role::Admin,
                passport_full_name: None,
                passport_number: None,
            })
            .await?;

        admin.level_access = LevelAccess::all();
        self.db.update_user(&admin).await?;

        tracing::info!(user_id = %admin.id, "Bootstrap admin created");
        Ok(true)
    }

    async fn find(&self, id: &str) -> Result<User, AppError> {
        self.db
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

fn normalize_username(raw: &str) -> Result<String, AppError> {
    let username = raw.trim();
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(AppError::Validation(
            "username: Username must be 3-50 characters".to_string(),
        ));
    }
    Ok(username.to_string())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn username_taken() -> AppError {
    AppError::Validation("Username already exists".to_string())
}
