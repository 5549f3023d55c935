// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: credential store, device bindings, question bank, results.
//!
//! [`Db`] dispatches to Firestore in production or to an in-process
//! [`MemoryStore`] for local runs and tests. Every call is bounded by the
//! configured store timeout.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, StoreBackend};
use crate::error::AppError;
use crate::models::{DeviceBinding, Level, Question, SwapOutcome, TestResult, User};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Device lock per user (keyed by user id)
    pub const DEVICE_BINDINGS: &str = "device_bindings";
    pub const QUESTIONS: &str = "questions";
    pub const RESULTS: &str = "test_results";
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
enum Backend {
    Memory(Arc<MemoryStore>),
    Firestore(FirestoreDb),
}

/// Store handle shared by all request handlers.
#[derive(Clone)]
pub struct Db {
    backend: Backend,
    timeout: Duration,
}

impl Db {
    /// Connect to the backend selected in `config`.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let db = match config.store_backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data is lost on restart");
                Self::in_memory()
            }
            StoreBackend::Firestore => {
                Self::from_firestore(FirestoreDb::new(&config.gcp_project_id).await?)
            }
        };
        Ok(db.with_timeout(Duration::from_millis(config.store_timeout_ms)))
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_firestore(db: FirestoreDb) -> Self {
        Self {
            backend: Backend::Firestore(db),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run a store operation under the configured timeout.
    async fn run<T, F>(&self, op: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        tokio::time::timeout(self.timeout, op)
            .await
            .map_err(|_| AppError::StoreTimeout(self.timeout.as_millis() as u64))?
    }

    // ─── Users ───────────────────────────────────────────────────

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        self.run(async {
            match &self.backend {
                Backend::Memory(store) => Ok(store.get_user(id)),
                Backend::Firestore(db) => db.get_user(id).await,
            }
        })
        .await
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.run(async {
            match &self.backend {
                Backend::Memory(store) => Ok(store.find_user_by_username(username)),
                Backend::Firestore(db) => db.find_user_by_username(username).await,
            }
        })
        .await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        Ok(self.find_user_by_username(username).await?.is_some())
    }

    /// Insert a new user. Returns `false` if the username is taken.
    pub async fn create_user(&self, user: &User) -> Result<bool, AppError> {
        self.run(async {
            match &self.backend {
                Backend::Memory(store) => Ok(store.create_user(user)),
                Backend::Firestore(db) => db.create_user(user).await,
            }
        })
        .await
    }

    /// Overwrite an existing user record. Returns `false` on a username collision.
    pub async fn update_user(&self, user: &User) -> Result<bool, AppError> {
        self.run(async {
            match &self.backend {
                Backend::Memory(store) => Ok(store.update_user(user)),
                Backend::Firestore(db) => db.update_user(user).await,
            }
        })
        .await
    }

    /// All users, newest first.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.run(async {
            match &self.backend {
                Backend::Memory(store) => Ok(store.list_users()),
                Backend::Firestore(db) => db.list_users().await,
            }
        })
        .await
    }

    /// Delete a user, their binding and their results. `false` if absent.
    pub async fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        self.run(async {
            match &self.backend {
                Backend::Memory(store) => Ok(store.delete_user(id)),
                Backend::Firestore(db) => db.delete_user(id).await,
            }
        })
        .await
    }

    // ─── Device Bindings ─────────────────────────────────────────

    pub async fn get_binding(&self, user_id: &str) -> Result<DeviceBinding, AppError> {
        self.run(async {
            match &self.backend {
                Backend::Memory(store) => Ok(store.get_binding(user_id)),
                Backend::Firestore(db) => db.get_binding(user_id).await,
            }
        })
        .await
    }

    /// Compare-and-swap the binding against the generation the caller read.
    pub async fn swap_binding(
        &self,
        user_id: &str,
        expected_generation: u64,
        device_id: Option<String>,
    ) -> Result<SwapOutcome, AppError> {
        self.run(async {
            match &self.backend {
                Backend::Memory(store) => {
                    Ok(store.swap_binding(user_id, expected_generation, device_id))
                }
                Backend::Firestore(db) => {
                    db.swap_binding(user_id, expected_generation, device_id)
                        .await
                }
            }
        })
        .await
    }

    /// Release the device lock regardless of its current state.
    pub async fn clear_binding(&self, user_id: &str) -> Result<DeviceBinding, AppError> {
        self.run(async {
            match &self.backend {
                Backend::Memory(store) => Ok(store.clear_binding(user_id)),
                Backend::Firestore(db) => db.clear_binding(user_id).await,
            }
        })
        .await
    }

    // ─── Questions ───────────────────────────────────────────────

    pub async fn insert_questions(&self, questions: &[Question]) -> Result<(), AppError> {
        self.run(async {
            match &self.backend {
                Backend::Memory(store) => {
                    store.insert_questions(questions);
                    Ok(())
                }
                Backend::Firestore(db) => db.insert_questions(questions).await,
            }
        })
        .await
    }

    pub async fn questions_for_level(&self, level: Level) -> Result<Vec<Question>, AppError> {
        self.run(async {
            match &self.backend {
                Backend::Memory(store) => Ok(store.questions_for_level(level)),
                Backend::Firestore(db) => db.questions_for_level(level).await,
            }
        })
        .await
    }

    // ─── Results ─────────────────────────────────────────────────

    pub async fn insert_result(&self, result: &TestResult) -> Result<(), AppError> {
        self.run(async {
            match &self.backend {
                Backend::Memory(store) => {
                    store.insert_result(result);
                    Ok(())
                }
                Backend::Firestore(db) => db.insert_result(result).await,
            }
        })
        .await
    }

    /// A user's results, newest first.
    pub async fn results_for_user(&self, user_id: &str) -> Result<Vec<TestResult>, AppError> {
        self.run(async {
            match &self.backend {
                Backend::Memory(store) => Ok(store.results_for_user(user_id)),
                Backend::Firestore(db) => db.results_for_user(user_id).await,
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_firestore_surfaces_database_error() {
        let db = Db::from_firestore(FirestoreDb::new_mock());
        let err = db.get_user("anyone").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_unknown_binding_is_unbound() {
        let db = Db::in_memory();
        let binding = db.get_binding("nobody").await.unwrap();
        assert_eq!(binding, DeviceBinding::default());
    }
}
