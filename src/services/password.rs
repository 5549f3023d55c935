// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing and verification (bcrypt).
//!
//! bcrypt is CPU-bound, so both operations run on the blocking pool.

use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::AppError;

#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    /// Hash of a throwaway password, verified against when the username is
    /// unknown so both login failure paths cost the same.
    dummy_hash: Arc<OnceCell<String>>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub async fn hash(&self, plain: &str) -> Result<String, AppError> {
        let plain = plain.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hash task failed: {}", e)))?
            .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
    }

    /// `true` only for the exact original plaintext.
    pub async fn verify(&self, plain: &str, hash: &str) -> Result<bool, AppError> {
        let plain = plain.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("verify task failed: {}", e)))?
            .map_err(|e| AppError::Internal(anyhow::anyhow!("stored hash unreadable: {}", e)))
    }

    /// Spend the same work as [`verify`](Self::verify) and return `false`.
    pub async fn verify_unknown_user(&self, plain: &str) -> Result<bool, AppError> {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| self.hash("quizgate-dummy-password"))
            .await?;
        self.verify(plain, dummy).await?;
        Ok(false)
    }
}
