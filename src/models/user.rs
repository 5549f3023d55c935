// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User identity model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// Quiz content tier. Serialized as its number (1, 2 or 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    One,
    Two,
    Three,
}

#[derive(Debug, thiserror::Error)]
#[error("Level must be 1, 2, or 3 (got {0})")]
pub struct InvalidLevel(pub u8);

impl Level {
    pub const ALL: [Level; 3] = [Level::One, Level::Two, Level::Three];

    /// Position in the entitlement table.
    const fn index(self) -> usize {
        match self {
            Level::One => 0,
            Level::Two => 1,
            Level::Three => 2,
        }
    }

    pub const fn number(self) -> u8 {
        self.index() as u8 + 1
    }
}

impl TryFrom<u8> for Level {
    type Error = InvalidLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Level::One),
            2 => Ok(Level::Two),
            3 => Ok(Level::Three),
            other => Err(InvalidLevel(other)),
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.number()
    }
}

impl std::str::FromStr for Level {
    type Err = InvalidLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s.trim().parse().map_err(|_| InvalidLevel(0))?;
        Level::try_from(n)
    }
}

/// Per-level entitlement flags, indexed by [`Level`].
///
/// Stored and sent over the wire as `{ "level1": bool, "level2": bool, "level3": bool }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LevelFlags", into = "LevelFlags")]
pub struct LevelAccess([bool; 3]);

impl LevelAccess {
    pub fn all() -> Self {
        Self([true; 3])
    }

    pub fn allows(&self, level: Level) -> bool {
        self.0[level.index()]
    }

    pub fn set(&mut self, level: Level, allowed: bool) {
        self.0[level.index()] = allowed;
    }
}

#[derive(Serialize, Deserialize)]
struct LevelFlags {
    #[serde(default)]
    level1: bool,
    #[serde(default)]
    level2: bool,
    #[serde(default)]
    level3: bool,
}

impl From<LevelFlags> for LevelAccess {
    fn from(flags: LevelFlags) -> Self {
        Self([flags.level1, flags.level2, flags.level3])
    }
}

impl From<LevelAccess> for LevelFlags {
    fn from(access: LevelAccess) -> Self {
        let [level1, level2, level3] = access.0;
        Self {
            level1,
            level2,
            level3,
        }
    }
}

/// User record stored in the credential store (document ID = `id`).
///
/// Device binding state is not part of this record; see
/// [`DeviceBinding`](crate::models::DeviceBinding).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Unique, case-sensitive, 3-50 characters
    pub username: String,
    /// bcrypt hash. Never leaves the server.
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(default)]
    pub passport_full_name: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    pub level_access: LevelAccess,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// Client-safe view of this user.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            username: self.username.clone(),
            role: self.role,
            is_active: self.is_active,
            level_access: self.level_access,
            passport_full_name: self.passport_full_name.clone(),
            passport_number: self.passport_number.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

/// User as exposed to clients and attached to authenticated requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
    #[cfg_attr(
        feature = "binding-generation",
        ts(type = "{ level1: boolean, level2: boolean, level3: boolean }")
    )]
    pub level_access: LevelAccess,
    pub passport_full_name: Option<String>,
    pub passport_number: Option<String>,
    pub created_at: String,
}

impl UserSummary {
    /// Whether this identity may take quizzes at `level`. Admins bypass entitlements.
    pub fn can_access_level(&self, level: Level) -> bool {
        self.role == Role::Admin || self.level_access.allows(level)
    }
}
