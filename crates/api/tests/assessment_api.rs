//! Integration tests for the assessment flow: start/resume, progress
//! saves, finish scoring, module locking, and the personalization
//! trailer.

mod common;

use axum::http::{Method, StatusCode};
use common::{build_test_app, seed_enrolled_module, seed_mcq, seed_template, seed_user_with_token, send};
use meridian_core::types::DbId;
use serde_json::json;
use sqlx::PgPool;

/// Build a finish body answering each question with the given option.
fn finish_body(answers: &[(DbId, &str)]) -> serde_json::Value {
    let responses: Vec<serde_json::Value> = answers
        .iter()
        .enumerate()
        .map(|(i, (question_id, answer))| {
            json!({
                "q_index": i,
                "question_id": question_id,
                "answer": answer,
                "skipped": false,
            })
        })
        .collect();
    json!({ "responses": responses })
}

#[sqlx::test(migrations = "../db/migrations")]
async fn start_creates_then_resumes_a_session(pool: PgPool) {
    let (user, token) = seed_user_with_token(&pool, "student@example.com").await;
    let (_, _, module_id) = seed_enrolled_module(&pool, user.id, "rust").await;
    let q1 = seed_mcq(&pool, module_id).await;

    let app = build_test_app(pool);

    let (status, body) =
        send(&app, Method::POST, "/api/v1/assessments/start", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let session_id = body["data"]["session"]["session_id"].as_i64().unwrap();
    assert_eq!(body["data"]["session"]["current_position"], 0);
    assert_eq!(body["data"]["questions"].as_array().unwrap().len(), 1);
    // Option correctness is never exposed to the client.
    assert!(body["data"]["questions"][0]["options"][0].get("is_correct").is_none());

    // Save progress at index 3, then start again: same session, saved
    // answers included.
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/assessments/sessions/{session_id}/progress"),
        Some(&token),
        Some(json!({
            "responses": [
                {"question_index": 3, "question_id": q1, "answer": "right", "skipped": false}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        send(&app, Method::POST, "/api/v1/assessments/start", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["session"]["session_id"].as_i64().unwrap(), session_id);
    assert_eq!(body["data"]["session"]["current_position"], 4);
    assert_eq!(
        body["data"]["session"]["responses"][q1.to_string()]["answer"],
        "right"
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn progress_resaves_overwrite_and_session_resumes_exactly(pool: PgPool) {
    let (user, token) = seed_user_with_token(&pool, "student@example.com").await;
    let (_, _, module_id) = seed_enrolled_module(&pool, user.id, "rust").await;
    let q1 = seed_mcq(&pool, module_id).await;

    let app = build_test_app(pool);

    let (_, body) = send(&app, Method::POST, "/api/v1/assessments/start", Some(&token), None).await;
    let session_id = body["data"]["session"]["session_id"].as_i64().unwrap();

    for answer in ["wrong", "right"] {
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/assessments/sessions/{session_id}/progress"),
            Some(&token),
            Some(json!({
                "responses": [
                    {"question_index": 0, "question_id": q1, "answer": answer, "skipped": false}
                ],
                "current_position": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/assessments/sessions/{session_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // The re-save overwrote the slot; exactly one response survives.
    assert_eq!(body["data"]["responses"].as_object().unwrap().len(), 1);
    assert_eq!(body["data"]["responses"][q1.to_string()]["answer"], "right");
    assert_eq!(body["data"]["current_position"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn finish_scores_and_personalizes_end_to_end(pool: PgPool) {
    let (user, token) = seed_user_with_token(&pool, "student@example.com").await;
    let (_, _, module_a) = seed_enrolled_module(&pool, user.id, "rust").await;
    let (_, _, module_b) = seed_enrolled_module(&pool, user.id, "sql").await;
    seed_template(&pool, Some("backend")).await;

    let mut questions_a = Vec::new();
    let mut questions_b = Vec::new();
    for _ in 0..5 {
        questions_a.push(seed_mcq(&pool, module_a).await);
        questions_b.push(seed_mcq(&pool, module_b).await);
    }

    let app = build_test_app(pool.clone());

    let (_, body) = send(&app, Method::POST, "/api/v1/assessments/start", Some(&token), None).await;
    let assessment_id = body["data"]["assessment_id"].as_i64().unwrap();

    // 4/5 correct in module A (80%), 5/5 in module B (100%): 9/10 = 90.
    let mut answers: Vec<(DbId, &str)> = Vec::new();
    for (i, q) in questions_a.iter().enumerate() {
        answers.push((*q, if i == 0 { "wrong" } else { "right" }));
    }
    for q in &questions_b {
        answers.push((*q, "right"));
    }

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/assessments/{assessment_id}/finish"),
        Some(&token),
        Some(finish_body(&answers)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["score"], 90);
    assert_eq!(body["data"]["passed"], true);
    assert_eq!(body["data"]["total"], 10);
    assert_eq!(body["data"]["correct"], 9);
    assert_eq!(body["data"]["assessment"]["score"], 90);

    // The trailer chain persisted module statuses.
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/learning-paths/module-status",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let statuses = body["data"].as_array().unwrap();
    assert_eq!(statuses.len(), 2);
    let by_module = |id: DbId| {
        statuses
            .iter()
            .find(|s| s["module_id"].as_i64() == Some(id))
            .unwrap()
    };
    assert_eq!(by_module(module_a)["correctness_percentage"], 80);
    assert_eq!(by_module(module_a)["status"], "mandatory");
    assert_eq!(by_module(module_b)["correctness_percentage"], 100);
    assert_eq!(by_module(module_b)["status"], "optional");

    // The personalized path annotates leaves per module.
    let (status, body) =
        send(&app, Method::GET, "/api/v1/learning-paths/my-path", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let structure = body["data"]["course_structure"].as_array().unwrap();
    let leaf = |module_id: DbId| {
        structure
            .iter()
            .flat_map(|c| c["subjects"].as_array().unwrap())
            .flat_map(|s| s["modules"].as_array().unwrap())
            .find(|m| m["id"].as_i64() == Some(module_id))
            .unwrap()
            .clone()
    };
    assert_eq!(leaf(module_a)["is_mandatory"], true);
    assert_eq!(leaf(module_a)["assessment_score"], 80);
    assert_eq!(leaf(module_b)["is_mandatory"], false);
    assert_eq!(leaf(module_b)["assessment_score"], 100);

    // A second finish on the same assessment conflicts.
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/assessments/{assessment_id}/finish"),
        Some(&token),
        Some(finish_body(&answers)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn finish_rejects_empty_and_foreign_submissions(pool: PgPool) {
    let (user, token) = seed_user_with_token(&pool, "student@example.com").await;
    let (_, _, module_id) = seed_enrolled_module(&pool, user.id, "rust").await;
    let q1 = seed_mcq(&pool, module_id).await;

    let (_, other_token) = seed_user_with_token(&pool, "other@example.com").await;

    let app = build_test_app(pool);

    let (_, body) = send(&app, Method::POST, "/api/v1/assessments/start", Some(&token), None).await;
    let assessment_id = body["data"]["assessment_id"].as_i64().unwrap();

    // Empty responses array fails validation before any store write.
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/assessments/{assessment_id}/finish"),
        Some(&token),
        Some(json!({"responses": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // Another user cannot finish this assessment.
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/assessments/{assessment_id}/finish"),
        Some(&other_token),
        Some(finish_body(&[(q1, "right")])),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Unknown assessment id is a 404.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/assessments/999999/finish",
        Some(&token),
        Some(finish_body(&[(q1, "right")])),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn two_wrong_answers_lock_the_module(pool: PgPool) {
    let (user, token) = seed_user_with_token(&pool, "student@example.com").await;
    let (_, _, module_a) = seed_enrolled_module(&pool, user.id, "rust").await;
    let (_, _, module_b) = seed_enrolled_module(&pool, user.id, "sql").await;

    let qa1 = seed_mcq(&pool, module_a).await;
    let qa2 = seed_mcq(&pool, module_a).await;
    let qa3 = seed_mcq(&pool, module_a).await;
    let qb1 = seed_mcq(&pool, module_b).await;

    let app = build_test_app(pool.clone());

    let (_, body) = send(&app, Method::POST, "/api/v1/assessments/start", Some(&token), None).await;
    let assessment_id = body["data"]["assessment_id"].as_i64().unwrap();
    assert_eq!(body["data"]["locked_modules"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["questions"].as_array().unwrap().len(), 4);

    // Two wrong answers in module A lock it mid-finish: qa3 would have
    // been correct but is force-skipped.
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/assessments/{assessment_id}/finish"),
        Some(&token),
        Some(finish_body(&[
            (qa1, "wrong"),
            (qa2, "wrong"),
            (qa3, "right"),
            (qb1, "right"),
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // Counted: qa1, qa2, qb1. Correct: qb1. Skipped: qa3 (forced).
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["correct"], 1);
    assert_eq!(body["data"]["skipped"], 1);
    assert_eq!(body["data"]["score"], 33);

    // A subsequent start hides module A's questions entirely.
    let (status, body) =
        send(&app, Method::POST, "/api/v1/assessments/start", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let locked: Vec<i64> = body["data"]["locked_modules"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();
    assert_eq!(locked, vec![module_a]);
    let question_modules: Vec<i64> = body["data"]["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["module_id"].as_i64().unwrap())
        .collect();
    assert!(question_modules.iter().all(|m| *m == module_b));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn evaluate_gives_feedback_without_persisting(pool: PgPool) {
    let (user, token) = seed_user_with_token(&pool, "student@example.com").await;
    let (_, _, module_id) = seed_enrolled_module(&pool, user.id, "rust").await;
    let q1 = seed_mcq(&pool, module_id).await;

    let app = build_test_app(pool.clone());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/assessments/evaluate",
        Some(&token),
        Some(json!({"question_id": q1, "answer": "right"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["correct"], true);

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/v1/assessments/evaluate",
        Some(&token),
        Some(json!({"question_id": q1, "answer": "wrong"})),
    )
    .await;
    assert_eq!(body["data"]["correct"], false);

    // Nothing was written to the durable ledger.
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM assessment_responses")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn abandoned_sessions_stay_terminal(pool: PgPool) {
    let (user, token) = seed_user_with_token(&pool, "student@example.com").await;
    let (_, _, module_id) = seed_enrolled_module(&pool, user.id, "rust").await;
    seed_mcq(&pool, module_id).await;

    let app = build_test_app(pool);

    let (_, body) = send(&app, Method::POST, "/api/v1/assessments/start", Some(&token), None).await;
    let session_id = body["data"]["session"]["session_id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/assessments/sessions/{session_id}/abandon"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "abandoned");

    // Saving progress into a terminal session conflicts.
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/assessments/sessions/{session_id}/progress"),
        Some(&token),
        Some(json!({
            "responses": [{"question_index": 0, "question_id": 1, "answer": "x", "skipped": false}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // A new start creates a fresh session.
    let (_, body) = send(&app, Method::POST, "/api/v1/assessments/start", Some(&token), None).await;
    assert_ne!(body["data"]["session"]["session_id"].as_i64().unwrap(), session_id);
}
