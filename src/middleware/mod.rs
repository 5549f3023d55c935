// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (access gate, role gates, security headers).

pub mod auth;
pub mod security;

pub use auth::{require_admin, require_auth, require_user, AuthUser};
