// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device binding: the single-slot session lock for a user.
//!
//! Stored separately from the identity record (`device_bindings/{user_id}`) so
//! it can be updated with its own compare-and-swap path.

use serde::{Deserialize, Serialize};

/// Current device lock for one user.
///
/// `generation` increments on every write; a writer that read generation `g`
/// may only replace the binding while it is still at `g`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceBinding {
    /// Bound device, `None` when no session holds the lock
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub generation: u64,
    /// Last change (RFC 3339)
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl DeviceBinding {
    pub fn is_bound(&self) -> bool {
        self.device_id.is_some()
    }

    /// The binding that replaces this one.
    pub fn advance(&self, device_id: Option<String>, now: &str) -> Self {
        Self {
            device_id,
            generation: self.generation + 1,
            updated_at: Some(now.to_string()),
        }
    }
}

/// Result of a compare-and-swap on a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The write landed; carries the new binding.
    Swapped(DeviceBinding),
    /// Another writer got there first; carries the binding now stored.
    Stale(DeviceBinding),
}
