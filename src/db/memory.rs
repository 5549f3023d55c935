// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backed by `DashMap`.
//!
//! Used for local development and tests. Binding swaps run under the map's
//! per-entry write lock, so check-and-bind is a single atomic step.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::models::{DeviceBinding, Level, Question, SwapOutcome, TestResult, User};
use crate::time_utils::now_rfc3339;

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    /// username -> user id, the uniqueness index
    usernames: DashMap<String, String>,
    bindings: DashMap<String, DeviceBinding>,
    questions: DashMap<String, Question>,
    results: DashMap<String, TestResult>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Users ───────────────────────────────────────────────────

    pub fn get_user(&self, id: &str) -> Option<User> {
        self.users.get(id).map(|u| u.clone())
    }

    pub fn find_user_by_username(&self, username: &str) -> Option<User> {
        let id = self.usernames.get(username).map(|id| id.clone())?;
        self.get_user(&id)
    }

    /// Insert a new user. Returns `false` if the username is taken.
    pub fn create_user(&self, user: &User) -> bool {
        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
                self.users.insert(user.id.clone(), user.clone());
                true
            }
        }
    }

    /// Overwrite a user record. Returns `false` if a rename collides with
    /// another user's username.
    pub fn update_user(&self, user: &User) -> bool {
        let previous = self.users.get(&user.id).map(|u| u.username.clone());

        if previous.as_deref() != Some(user.username.as_str()) {
            match self.usernames.entry(user.username.clone()) {
                Entry::Occupied(owner) if owner.get() != &user.id => return false,
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(user.id.clone());
                }
            }
            if let Some(old) = previous {
                self.usernames.remove(&old);
            }
        }

        self.users.insert(user.id.clone(), user.clone());
        true
    }

    pub fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        users
    }

    /// Remove a user with their binding and results.
    pub fn delete_user(&self, id: &str) -> bool {
        let Some((_, user)) = self.users.remove(id) else {
            return false;
        };
        self.usernames.remove(&user.username);
        self.bindings.remove(id);
        self.results.retain(|_, r| r.user_id != id);
        true
    }

    // ─── Device Bindings ─────────────────────────────────────────

    pub fn get_binding(&self, user_id: &str) -> DeviceBinding {
        self.bindings
            .get(user_id)
            .map(|b| b.clone())
            .unwrap_or_default()
    }

    pub fn swap_binding(
        &self,
        user_id: &str,
        expected_generation: u64,
        device_id: Option<String>,
    ) -> SwapOutcome {
        let mut current = self.bindings.entry(user_id.to_string()).or_default();
        if current.generation != expected_generation {
            return SwapOutcome::Stale(current.clone());
        }
        let next = current.advance(device_id, &now_rfc3339());
        *current = next.clone();
        SwapOutcome::Swapped(next)
    }

    pub fn clear_binding(&self, user_id: &str) -> DeviceBinding {
        let mut current = self.bindings.entry(user_id.to_string()).or_default();
        let next = current.advance(None, &now_rfc3339());
        *current = next.clone();
        next
    }

    // ─── Questions ───────────────────────────────────────────────

    pub fn insert_questions(&self, questions: &[Question]) {
        for question in questions {
            self.questions.insert(question.id.clone(), question.clone());
        }
    }

    pub fn questions_for_level(&self, level: Level) -> Vec<Question> {
        let mut questions: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| q.level == level)
            .map(|q| q.value().clone())
            .collect();
        questions.sort_by_key(|q| q.number);
        questions
    }

    // ─── Results ─────────────────────────────────────────────────

    pub fn insert_result(&self, result: &TestResult) {
        self.results.insert(result.id.clone(), result.clone());
    }

    pub fn results_for_user(&self, user_id: &str) -> Vec<TestResult> {
        let mut results: Vec<TestResult> = self
            .results
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results
    }
}
