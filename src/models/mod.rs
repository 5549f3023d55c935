// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod quiz;
pub mod session;
pub mod user;

pub use quiz::{PublicQuestion, Question, ResultSummary, TestResult, TestType};
pub use session::{DeviceBinding, SwapOutcome};
pub use user::{Level, LevelAccess, Role, User, UserSummary};
