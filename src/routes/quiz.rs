// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quiz routes: question delivery, grading and result history.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::models::{Level, PublicQuestion, ResultSummary, TestResult, TestType};
use crate::services::{LegacyCompletion, Submission};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tests/questions/{level}/{type}", get(get_questions))
        .route("/tests/submit", post(submit))
        .route("/tests/results", get(results))
        .route("/tests/legacy-complete", post(legacy_complete))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub level: Level,
    #[serde(rename = "type")]
    pub test_type: TestType,
    #[validate(length(min = 1, message = "questionIds must be a non-empty array"))]
    pub question_ids: Vec<String>,
    #[validate(length(min = 1, message = "Answers must be a non-empty array"))]
    pub answers: Vec<u8>,
    pub time_spent: u64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCompleteRequest {
    pub level: Level,
    #[serde(rename = "type")]
    pub test_type: TestType,
    pub time_spent: u64,
    #[validate(range(max = 100, message = "Score must be between 0 and 100"))]
    pub score: Option<u8>,
    pub correct: Option<u32>,
    pub wrong: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub message: &'static str,
    pub result: ResultSummary,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub results: Vec<TestResult>,
}

async fn get_questions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((level, test_type)): Path<(String, String)>,
) -> Result<Json<QuestionsResponse>> {
    let level = level
        .parse::<Level>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let test_type = test_type
        .parse::<TestType>()
        .map_err(AppError::BadRequest)?;

    let questions = state
        .quiz
        .questions_for(&user.profile, level, test_type)
        .await?;
    Ok(Json(QuestionsResponse { questions }))
}

async fn submit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<SubmitRequest>,
) -> Result<Json<SubmitResponse>> {
    let result = state
        .quiz
        .submit(
            &user.profile,
            Submission {
                level: req.level,
                test_type: req.test_type,
                question_ids: req.question_ids,
                answers: req.answers,
                time_spent: req.time_spent,
            },
        )
        .await?;

    Ok(Json(SubmitResponse {
        message: "Test submitted successfully",
        result,
    }))
}

async fn results(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ResultsResponse>> {
    let results = state.quiz.results(&user.profile).await?;
    Ok(Json(ResultsResponse { results }))
}

async fn legacy_complete(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<LegacyCompleteRequest>,
) -> Result<Json<SubmitResponse>> {
    let result = state
        .quiz
        .record_legacy(
            &user.profile,
            LegacyCompletion {
                level: req.level,
                test_type: req.test_type,
                time_spent: req.time_spent,
                score: req.score,
                correct: req.correct,
                wrong: req.wrong,
            },
        )
        .await?;

    Ok(Json(SubmitResponse {
        message: "Legacy test recorded successfully",
        result,
    }))
}
