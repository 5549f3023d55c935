// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quizgate API Server
//!
//! Serves quizzes to users holding a single-device session, plus the admin
//! surface for managing those users.

use anyhow::Context;
use quizgate::{config::Config, db::Db, AppState};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        port = config.port,
        production = config.is_production(),
        "Starting Quizgate API"
    );

    let db = Db::connect(&config)
        .await
        .context("Failed to connect to store")?;

    let state = Arc::new(AppState::new(config.clone(), db));

    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        let created = state
            .users
            .ensure_admin(username, password)
            .await
            .context("Failed to bootstrap admin user")?;
        tracing::info!(username = %username, created, "Bootstrap admin checked");
    }

    if let Some(path) = &config.questions_file {
        let count = state
            .quiz
            .load_question_bank(Path::new(path))
            .await
            .context("Failed to load question bank")?;
        tracing::info!(path = %path, count, "Question bank loaded");
    }

    // Build router
    let app = quizgate::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizgate=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
