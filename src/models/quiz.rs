// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quiz questions and graded results.

use serde::{Deserialize, Serialize};

use crate::models::Level;

/// Which slice of a level's 90-question bank a test draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestType {
    #[serde(rename = "1-45")]
    FirstHalf,
    #[serde(rename = "46-90")]
    SecondHalf,
    #[serde(rename = "full")]
    Full,
}

impl TestType {
    /// Inclusive question-number range.
    pub fn number_range(self) -> std::ops::RangeInclusive<u8> {
        match self {
            TestType::FirstHalf => 1..=45,
            TestType::SecondHalf => 46..=90,
            TestType::Full => 1..=90,
        }
    }

    pub fn sample_size(self) -> usize {
        match self {
            TestType::FirstHalf | TestType::SecondHalf => 45,
            TestType::Full => 90,
        }
    }
}

impl std::str::FromStr for TestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1-45" => Ok(TestType::FirstHalf),
            "46-90" => Ok(TestType::SecondHalf),
            "full" => Ok(TestType::Full),
            other => Err(format!("Invalid test type: {other}")),
        }
    }
}

/// Stored question, including the answer key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub level: Level,
    /// Position in the level's bank, 1-90
    pub number: u8,
    pub question: String,
    /// Exactly four choices
    pub options: Vec<String>,
    /// Index into `options`, 0-3
    pub correct_answer_index: u8,
}

impl Question {
    pub fn public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id.clone(),
            level: self.level,
            number: self.number,
            question: self.question.clone(),
            options: self.options.clone(),
        }
    }
}

/// Question as delivered to a test taker. Never carries the answer key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: String,
    pub level: Level,
    pub number: u8,
    pub question: String,
    pub options: Vec<String>,
}

/// A completed attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: String,
    pub user_id: String,
    pub level: Level,
    #[serde(rename = "type")]
    pub test_type: TestType,
    /// Percentage 0-100
    pub score: u8,
    pub correct: u32,
    pub wrong: u32,
    /// Seconds
    pub time_spent: u64,
    pub created_at: String,
}

/// Grading outcome returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub total: u32,
    pub correct: u32,
    pub wrong: u32,
    pub score: u8,
    pub time_spent: u64,
}
