// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle: login, logout and administrative device reset.
//!
//! Binding a device is a compare-and-swap against the generation read before
//! the policy check, so two logins racing for an unbound account cannot both
//! win with different devices.

use crate::db::Db;
use crate::error::AppError;
use crate::models::{SwapOutcome, User, UserSummary};
use crate::services::device::{self, MAX_DEVICE_ID_LEN};
use crate::services::{PasswordHasher, TokenCodec};

/// Everything a successful login hands back to the transport layer.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub device_id: String,
    pub user: UserSummary,
}

#[derive(Clone)]
pub struct SessionManager {
    db: Db,
    tokens: TokenCodec,
    passwords: PasswordHasher,
}

impl SessionManager {
    pub fn new(db: Db, tokens: TokenCodec, passwords: PasswordHasher) -> Self {
        Self {
            db,
            tokens,
            passwords,
        }
    }

    /// Authenticate, bind the device and issue a token.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        presented_device: Option<&str>,
    ) -> Result<LoginOutcome, AppError> {
        let Some(user) = self.db.find_user_by_username(username).await? else {
            self.passwords.verify_unknown_user(password).await?;
            tracing::debug!("Login rejected: unknown username");
            return Err(AppError::InvalidCredentials);
        };

        if !self.passwords.verify(password, &user.password_hash).await? {
            tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_active {
            tracing::info!(user_id = %user.id, "Login rejected: account disabled");
            return Err(AppError::AccountDisabled);
        }

        let presented = device::normalize(presented_device);
        if presented.is_some_and(|id| id.len() > MAX_DEVICE_ID_LEN) {
            return Err(AppError::Validation(format!(
                "deviceId: must be at most {MAX_DEVICE_ID_LEN} characters"
            )));
        }

        let binding = self.db.get_binding(&user.id).await?;
        if let Err(e) = device::evaluate(binding.device_id.as_deref(), presented).into_result() {
            tracing::info!(user_id = %user.id, error = %e, "Login rejected by device policy");
            return Err(e);
        }

        let device_id = match presented {
            Some(id) => id.to_string(),
            None => device::generate_device_id()?,
        };

        match self
            .db
            .swap_binding(&user.id, binding.generation, Some(device_id.clone()))
            .await?
        {
            SwapOutcome::Swapped(_) => {}
            SwapOutcome::Stale(current) if current.device_id.as_deref() == Some(device_id.as_str()) => {
                tracing::debug!(user_id = %user.id, "Concurrent login bound the same device");
            }
            SwapOutcome::Stale(_) => {
                tracing::warn!(user_id = %user.id, "Lost device binding race to another device");
                return Err(AppError::DeviceConflict);
            }
        }

        let token = self.tokens.issue(&user).map_err(anyhow::Error::from)?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginOutcome {
            token,
            device_id,
            user: user.summary(),
        })
    }

    /// Release the caller's device lock. Idempotent.
    pub async fn logout(&self, user_id: &str) -> Result<(), AppError> {
        self.db.clear_binding(user_id).await?;
        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Clear another user's device lock.
    pub async fn force_reset_device(&self, target_id: &str) -> Result<User, AppError> {
        let user = self
            .db
            .get_user(target_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        self.db.clear_binding(&user.id).await?;
        tracing::info!(user_id = %user.id, "Device binding reset by admin");

        Ok(user)
    }
}
