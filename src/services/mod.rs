// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod device;
pub mod password;
pub mod quiz;
pub mod session;
pub mod token;
pub mod users;

pub use password::PasswordHasher;
pub use quiz::{LegacyCompletion, QuizService, Submission};
pub use session::{LoginOutcome, SessionManager};
pub use token::{Claims, TokenCodec, TokenError};
pub use users::{LevelAccessUpdate, NewUser, UserService, UserUpdate};
