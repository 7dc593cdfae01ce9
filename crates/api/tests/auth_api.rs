//! Integration tests for login, refresh rotation, and logout.

mod common;

use axum::http::{Method, StatusCode};
use common::{build_test_app, seed_user_with_token, send};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn login_refresh_logout_round_trip(pool: PgPool) {
    seed_user_with_token(&pool, "student@example.com").await;

    let app = build_test_app(pool);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "student@example.com", "password": "test-password-123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access_token"].as_str().unwrap().to_string();
    let refresh = body["refresh_token"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["email"], "student@example.com");
    // The password hash never leaks.
    assert!(body["user"].get("password_hash").is_none());

    // Refresh rotates: the new pair works, the old refresh token dies.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({"refresh_token": refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["refresh_token"].as_str().unwrap(), refresh);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({"refresh_token": refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Logout revokes everything.
    let (status, _) = send(&app, Method::POST, "/api/v1/auth/logout", Some(&access), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let new_refresh = body["refresh_token"].as_str().unwrap();
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({"refresh_token": new_refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn wrong_password_is_unauthorized(pool: PgPool) {
    seed_user_with_token(&pool, "student@example.com").await;

    let app = build_test_app(pool);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "student@example.com", "password": "not-the-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}
