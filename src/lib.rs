// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quizgate: quiz delivery behind single-device sessions.
//!
//! This crate provides the backend API: login with a device lock, an access
//! gate on every request, admin user management and graded quizzes.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod id_utils;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::{PasswordHasher, QuizService, SessionManager, TokenCodec, UserService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub tokens: TokenCodec,
    pub passwords: PasswordHasher,
    pub sessions: SessionManager,
    pub users: UserService,
    pub quiz: QuizService,
}

impl AppState {
    /// Wire the services over `db` using `config`.
    pub fn new(config: Config, db: Db) -> Self {
        let tokens = TokenCodec::new(&config.jwt_signing_key, config.token_ttl_secs);
        let passwords = PasswordHasher::new(config.bcrypt_cost);
        let sessions = SessionManager::new(db.clone(), tokens.clone(), passwords.clone());
        let users = UserService::new(db.clone(), passwords.clone());
        let quiz = QuizService::new(db.clone());

        Self {
            config,
            db,
            tokens,
            passwords,
            sessions,
            users,
            quiz,
        }
    }
}
