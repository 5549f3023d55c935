// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quiz delivery and grading.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::db::Db;
use crate::error::AppError;
use crate::id_utils::new_record_id;
use crate::models::{
    Level, PublicQuestion, Question, ResultSummary, TestResult, TestType, UserSummary,
};
use crate::time_utils::now_rfc3339;

/// An attempt graded against the stored answer key.
#[derive(Debug, Clone)]
pub struct Submission {
    pub level: Level,
    pub test_type: TestType,
    pub question_ids: Vec<String>,
    pub answers: Vec<u8>,
    pub time_spent: u64,
}

/// An attempt scored outside this service.
#[derive(Debug, Clone)]
pub struct LegacyCompletion {
    pub level: Level,
    pub test_type: TestType,
    pub time_spent: u64,
    pub score: Option<u8>,
    pub correct: Option<u32>,
    pub wrong: Option<u32>,
}

#[derive(Clone)]
pub struct QuizService {
    db: Db,
}

impl QuizService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Random sample of the level's questions in the range `test_type` covers.
    pub async fn questions_for(
        &self,
        identity: &UserSummary,
        level: Level,
        test_type: TestType,
    ) -> Result<Vec<PublicQuestion>, AppError> {
        ensure_level_access(identity, level)?;

        let range = test_type.number_range();
        let mut pool: Vec<Question> = self
            .db
            .questions_for_level(level)
            .await?
            .into_iter()
            .filter(|q| range.contains(&q.number))
            .collect();

        fastrand::shuffle(&mut pool);
        pool.truncate(test_type.sample_size());

        Ok(pool.iter().map(Question::public).collect())
    }

    /// Grade and persist an attempt.
    pub async fn submit(
        &self,
        identity: &UserSummary,
        submission: Submission,
    ) -> Result<ResultSummary, AppError> {
        ensure_level_access(identity, submission.level)?;

        if submission.question_ids.len() != submission.answers.len() {
            return Err(AppError::BadRequest(
                "questionIds and answers must have the same length".to_string(),
            ));
        }

        let bank = self.db.questions_for_level(submission.level).await?;
        let summary = grade(&bank, &submission)?;

        let result = TestResult {
            id: new_record_id()?,
            user_id: identity.id.clone(),
            level: submission.level,
            test_type: submission.test_type,
            score: summary.score,
            correct: summary.correct,
            wrong: summary.wrong,
            time_spent: summary.time_spent,
            created_at: now_rfc3339(),
        };
        self.db.insert_result(&result).await?;

        tracing::info!(
            user_id = %identity.id,
            level = submission.level.number(),
            score = summary.score,
            "Test submitted"
        );

        Ok(summary)
    }

    /// Record an externally scored attempt; missing numbers count as zero.
    pub async fn record_legacy(
        &self,
        identity: &UserSummary,
        completion: LegacyCompletion,
    ) -> Result<ResultSummary, AppError> {
        ensure_level_access(identity, completion.level)?;

        let score = completion.score.unwrap_or(0);
        if score > 100 {
            return Err(AppError::Validation(
                "score: must be between 0 and 100".to_string(),
            ));
        }
        let correct = completion.correct.unwrap_or(0);
        let wrong = completion.wrong.unwrap_or(0);
        let total = correct.checked_add(wrong).ok_or_else(|| {
            AppError::Validation("correct + wrong: question count out of range".to_string())
        })?;

        let result = TestResult {
            id: new_record_id()?,
            user_id: identity.id.clone(),
            level: completion.level,
            test_type: completion.test_type,
            score,
            correct,
            wrong,
            time_spent: completion.time_spent,
            created_at: now_rfc3339(),
        };
        self.db.insert_result(&result).await?;

        tracing::info!(user_id = %identity.id, level = completion.level.number(), "Legacy test recorded");

        Ok(ResultSummary {
            total,
            correct,
            wrong,
            score,
            time_spent: completion.time_spent,
        })
    }

    pub async fn results(&self, identity: &UserSummary) -> Result<Vec<TestResult>, AppError> {
        self.db.results_for_user(&identity.id).await
    }

    /// Load a JSON question bank into the store. Returns the number loaded.
    pub async fn load_question_bank(&self, path: &Path) -> Result<usize, AppError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "failed to read question bank {}: {}",
                path.display(),
                e
            ))
        })?;
        let questions: Vec<Question> = serde_json::from_str(&raw).map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "failed to parse question bank {}: {}",
                path.display(),
                e
            ))
        })?;

        for q in &questions {
            validate_question(q)?;
        }

        self.db.insert_questions(&questions).await?;
        Ok(questions.len())
    }
}

fn ensure_level_access(identity: &UserSummary, level: Level) -> Result<(), AppError> {
    if identity.can_access_level(level) {
        Ok(())
    } else {
        tracing::debug!(user_id = %identity.id, level = level.number(), "Level access denied");
        Err(AppError::LevelAccessDenied)
    }
}

fn validate_question(q: &Question) -> Result<(), AppError> {
    let problem = if !(1..=90).contains(&q.number) {
        Some("number must be between 1 and 90")
    } else if q.options.len() != 4 {
        Some("exactly four options are required")
    } else if usize::from(q.correct_answer_index) >= q.options.len() {
        Some("correctAnswerIndex out of range")
    } else {
        None
    };

    match problem {
        Some(msg) => Err(AppError::Validation(format!("question {}: {}", q.id, msg))),
        None => Ok(()),
    }
}

/// Score a submission against `bank` (the questions stored for its level).
///
/// Every submitted id must appear exactly once and belong to the level.
pub fn grade(bank: &[Question], submission: &Submission) -> Result<ResultSummary, AppError> {
    let answer_key: HashMap<&str, u8> = bank
        .iter()
        .map(|q| (q.id.as_str(), q.correct_answer_index))
        .collect();

    let mut seen = HashSet::with_capacity(submission.question_ids.len());
    let mut correct = 0u32;
    for (id, answer) in submission.question_ids.iter().zip(&submission.answers) {
        let expected = answer_key
            .get(id.as_str())
            .ok_or_else(|| AppError::BadRequest("Invalid question set".to_string()))?;
        if !seen.insert(id.as_str()) {
            return Err(AppError::BadRequest("Invalid question set".to_string()));
        }
        if answer == expected {
            correct += 1;
        }
    }

    let total = submission.answers.len() as u32;
    if total == 0 {
        return Err(AppError::Validation(
            "answers: must be a non-empty array".to_string(),
        ));
    }

    let score = (f64::from(correct) / f64::from(total) * 100.0).round() as u8;

    Ok(ResultSummary {
        total,
        correct,
        wrong: total - correct,
        score,
        time_spent: submission.time_spent,
    })
}
