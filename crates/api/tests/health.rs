//! Health endpoint smoke test.

mod common;

use axum::http::{Method, StatusCode};
use common::{build_test_app, send};
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn health_returns_ok(pool: PgPool) {
    let app = build_test_app(pool);

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn protected_routes_reject_missing_token(pool: PgPool) {
    let app = build_test_app(pool);

    let (status, body) = send(&app, Method::GET, "/api/v1/assessments/latest", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}
