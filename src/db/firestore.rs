// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (identity records)
//! - Device bindings (single-device session locks)
//! - Questions (read-mostly question bank)
//! - Results (graded attempts)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{DeviceBinding, Level, Question, SwapOutcome, TestResult, User};
use crate::time_utils::now_rfc3339;
use futures_util::{stream, StreamExt};
use std::time::Duration;

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;
/// Attempts at a binding transaction before giving up on contention.
const BINDING_TXN_ATTEMPTS: u32 = 5;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self::with_client(Some(client)))
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self::with_client(Some(client)))
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self::with_client(None)
    }

    fn with_client(client: Option<firestore::FirestoreDb>) -> Self {
        Self { client }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by document ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Look up a user by exact (case-sensitive) username.
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("username").eq(username)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    /// Create or update a user document.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Insert a new user. Returns `false` if the username is taken.
    ///
    /// The uniqueness check and the write are separate calls; concurrent
    /// creates of the same username from two instances are not excluded.
    pub async fn create_user(&self, user: &User) -> Result<bool, AppError> {
        if self.find_user_by_username(&user.username).await?.is_some() {
            return Ok(false);
        }
        self.upsert_user(user).await?;
        Ok(true)
    }

    /// Overwrite a user. Returns `false` if a rename collides with another user.
    pub async fn update_user(&self, user: &User) -> Result<bool, AppError> {
        if let Some(owner) = self.find_user_by_username(&user.username).await? {
            if owner.id != user.id {
                return Ok(false);
            }
        }
        self.upsert_user(user).await?;
        Ok(true)
    }

    /// All users, newest first.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a user together with their binding and results.
    ///
    /// Returns `false` if the user did not exist.
    pub async fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        if self.get_user(id).await?.is_none() {
            return Ok(false);
        }

        let results = self.results_for_user(id).await?;
        let count = results.len();
        self.batch_delete(&results, collections::RESULTS, |r: &TestResult| {
            r.id.clone()
        })
        .await?;
        tracing::debug!(user_id = id, count, "Deleted test results");

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::DEVICE_BINDINGS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(user_id = id, "User deleted");
        Ok(true)
    }

    // ─── Device Binding Operations ───────────────────────────────

    /// Get the binding for a user (unbound default if none stored).
    pub async fn get_binding(&self, user_id: &str) -> Result<DeviceBinding, AppError> {
        let binding: Option<DeviceBinding> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DEVICE_BINDINGS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(binding.unwrap_or_default())
    }

    /// Read-modify-write a binding inside a Firestore transaction.
    ///
    /// The read is bound to the transaction, so a concurrent commit on the same
    /// document from any instance makes ours fail. A failed commit is retried
    /// from a fresh read; `next` sees the winner's binding and can decline.
    /// `next` returning `None` leaves the document untouched and yields
    /// [`SwapOutcome::Stale`].
    async fn transact_binding<F>(&self, user_id: &str, next: F) -> Result<SwapOutcome, AppError>
    where
        F: Fn(&DeviceBinding) -> Option<DeviceBinding>,
    {
        let client = self.get_client()?;

        for attempt in 1..=BINDING_TXN_ATTEMPTS {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            let in_txn = client.clone_with_consistency_selector(
                firestore::FirestoreConsistencySelector::Transaction(
                    transaction.transaction_id().clone(),
                ),
            );
            let read: Result<Option<DeviceBinding>, _> = in_txn
                .fluent()
                .select()
                .by_id_in(collections::DEVICE_BINDINGS)
                .obj()
                .one(user_id)
                .await;
            let current = match read {
                Ok(binding) => binding.unwrap_or_default(),
                Err(e) => {
                    let _ = transaction.rollback().await;
                    return Err(AppError::Database(format!(
                        "Failed to read binding in transaction: {}",
                        e
                    )));
                }
            };

            let Some(updated) = next(&current) else {
                let _ = transaction.rollback().await;
                return Ok(SwapOutcome::Stale(current));
            };

            client
                .fluent()
                .update()
                .in_col(collections::DEVICE_BINDINGS)
                .document_id(user_id)
                .object(&updated)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add binding to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => return Ok(SwapOutcome::Swapped(updated)),
                Err(e) if attempt < BINDING_TXN_ATTEMPTS => {
                    tracing::debug!(user_id, attempt, error = %e, "Binding commit contended, retrying");
                    let backoff = 20 * u64::from(attempt) + fastrand::u64(0..20);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => {
                    return Err(AppError::Database(format!(
                        "Binding transaction commit failed: {}",
                        e
                    )));
                }
            }
        }

        Err(AppError::Database(
            "Binding transaction retries exhausted".to_string(),
        ))
    }

    /// Replace the binding only if it is still at `expected_generation`.
    pub async fn swap_binding(
        &self,
        user_id: &str,
        expected_generation: u64,
        device_id: Option<String>,
    ) -> Result<SwapOutcome, AppError> {
        let now = now_rfc3339();
        self.transact_binding(user_id, |current| {
            (current.generation == expected_generation)
                .then(|| current.advance(device_id.clone(), &now))
        })
        .await
    }

    /// Unconditionally release the device lock.
    pub async fn clear_binding(&self, user_id: &str) -> Result<DeviceBinding, AppError> {
        let now = now_rfc3339();
        match self
            .transact_binding(user_id, |current| Some(current.advance(None, &now)))
            .await?
        {
            SwapOutcome::Swapped(binding) | SwapOutcome::Stale(binding) => Ok(binding),
        }
    }

    // ─── Question Operations ─────────────────────────────────────

    /// Store questions, with a bounded number of concurrent writes.
    pub async fn insert_questions(&self, questions: &[Question]) -> Result<(), AppError> {
        let client = self.get_client()?;

        stream::iter(questions.to_vec())
            .map(|question| async move {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::QUESTIONS)
                    .document_id(&question.id)
                    .object(&question)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    /// Every question of a level, ordered by number.
    pub async fn questions_for_level(&self, level: Level) -> Result<Vec<Question>, AppError> {
        let level_number = u64::from(level.number());
        self.get_client()?
            .fluent()
            .select()
            .from(collections::QUESTIONS)
            .filter(move |q| q.for_all([q.field("level").eq(level_number)]))
            .order_by([("number", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Result Operations ───────────────────────────────────────

    pub async fn insert_result(&self, result: &TestResult) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::RESULTS)
            .document_id(&result.id)
            .object(result)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// A user's results, newest first.
    pub async fn results_for_user(&self, user_id: &str) -> Result<Vec<TestResult>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::RESULTS)
            .filter(|q| q.for_all([q.field("userId").eq(user_id)]))
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}
