// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quiz delivery and grading tests.

use axum::{http::StatusCode, Router};
use quizgate::models::{Level, LevelAccess, Role};
use quizgate::AppState;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

mod common;
use common::{body_json, send, Session};

/// App with all three question banks and a user licensed for level 1 only.
async fn quiz_app() -> (Router, Arc<AppState>, Session) {
    let (app, state) = common::create_test_app();
    for level in Level::ALL {
        state
            .db
            .insert_questions(&common::question_bank(level))
            .await
            .unwrap();
    }

    let mut access = LevelAccess::default();
    access.set(Level::One, true);
    common::seed_user(&state, "alice", Role::User, true, access).await;
    let session = Session::start(&app, "alice", "dev-1").await;
    (app, state, session)
}

#[tokio::test]
async fn test_questions_for_each_test_type() {
    let (app, _, alice) = quiz_app().await;

    for (test_type, count, range) in [
        ("1-45", 45, 1..=45),
        ("46-90", 45, 46..=90),
        ("full", 90, 1..=90),
    ] {
        let response = send(&app, alice.get(&format!("/tests/questions/1/{test_type}"))).await;
        assert_eq!(response.status(), StatusCode::OK, "{test_type}");

        let body = body_json(response).await;
        let questions = body["questions"].as_array().unwrap();
        assert_eq!(questions.len(), count);

        let ids: HashSet<&str> = questions.iter().map(|q| q["id"].as_str().unwrap()).collect();
        assert_eq!(ids.len(), count, "no duplicates");

        for q in questions {
            let number = q["number"].as_u64().unwrap();
            assert!(range.contains(&number));
            assert_eq!(q["level"], 1);
            assert!(q.get("correctAnswerIndex").is_none());
            assert_eq!(q["options"].as_array().unwrap().len(), 4);
        }
    }
}

#[tokio::test]
async fn test_invalid_level_or_type() {
    let (app, _, alice) = quiz_app().await;

    for uri in ["/tests/questions/1/half", "/tests/questions/4/full", "/tests/questions/x/full"] {
        let response = send(&app, alice.get(uri)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_level_access_enforced() {
    let (app, state, alice) = quiz_app().await;

    let response = send(&app, alice.get("/tests/questions/2/full")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "level_access_denied");

    // Admins bypass entitlements.
    common::seed_user(&state, "root", Role::Admin, true, LevelAccess::default()).await;
    let admin = Session::start(&app, "root", "admin-laptop").await;
    let response = send(&app, admin.get("/tests/questions/3/46-90")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_submit_grades_and_records() {
    let (app, _, alice) = quiz_app().await;

    // Answer key is number % 4: q1 -> 1, q2 -> 2, q3 -> 3, q4 -> 0.
    let response = send(
        &app,
        alice.send_json(
            "POST",
            "/tests/submit",
            json!({
                "level": 1,
                "type": "1-45",
                "questionIds": ["l1-q1", "l1-q2", "l1-q3", "l1-q4"],
                "answers": [1, 2, 0, 0],
                "timeSpent": 300
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["result"],
        json!({ "total": 4, "correct": 3, "wrong": 1, "score": 75, "timeSpent": 300 })
    );

    let response = send(&app, alice.get("/tests/results")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["type"], "1-45");
    assert_eq!(results[0]["score"], 75);
}

#[tokio::test]
async fn test_submit_rejects_bad_question_sets() {
    let (app, _, alice) = quiz_app().await;

    let cases = [
        // length mismatch
        json!({ "level": 1, "type": "full", "questionIds": ["l1-q1", "l1-q2"], "answers": [1], "timeSpent": 1 }),
        // question from another level
        json!({ "level": 1, "type": "full", "questionIds": ["l2-q1"], "answers": [1], "timeSpent": 1 }),
        // duplicate id
        json!({ "level": 1, "type": "full", "questionIds": ["l1-q1", "l1-q1"], "answers": [1, 1], "timeSpent": 1 }),
    ];
    for case in cases {
        let response = send(&app, alice.send_json("POST", "/tests/submit", case.clone())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{case}");
        assert_eq!(body_json(response).await["error"], "bad_request");
    }

    let response = send(
        &app,
        alice.send_json(
            "POST",
            "/tests/submit",
            json!({ "level": 1, "type": "full", "questionIds": [], "answers": [], "timeSpent": 1 }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");

    let response = send(
        &app,
        alice.send_json(
            "POST",
            "/tests/submit",
            json!({ "level": 2, "type": "full", "questionIds": ["l2-q1"], "answers": [1], "timeSpent": 1 }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, alice.get("/tests/results")).await;
    assert!(body_json(response).await["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_legacy_complete() {
    let (app, _, alice) = quiz_app().await;

    let response = send(
        &app,
        alice.send_json(
            "POST",
            "/tests/legacy-complete",
            json!({ "level": 1, "type": "full", "timeSpent": 1200, "score": 88, "correct": 79, "wrong": 11 }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["result"],
        json!({ "total": 90, "correct": 79, "wrong": 11, "score": 88, "timeSpent": 1200 })
    );

    let response = send(
        &app,
        alice.send_json(
            "POST",
            "/tests/legacy-complete",
            json!({ "level": 1, "type": "full", "timeSpent": 10, "score": 101 }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");
}

#[tokio::test]
async fn test_legacy_complete_rejects_overflowing_counts() {
    let (app, _, alice) = quiz_app().await;

    let response = send(
        &app,
        alice.send_json(
            "POST",
            "/tests/legacy-complete",
            json!({ "level": 1, "type": "full", "timeSpent": 10, "correct": 4294967295u32, "wrong": 1 }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");

    let response = send(&app, alice.get("/tests/results")).await;
    assert!(body_json(response).await["results"].as_array().unwrap().is_empty());
}
