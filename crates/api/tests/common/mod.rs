//! Shared fixtures for API integration tests.
//!
//! Mirrors the router construction in `main.rs` so tests exercise the
//! same middleware stack (CORS, request ID, timeout, panic recovery)
//! that production uses.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;

use meridian_api::auth::jwt::{generate_access_token, JwtConfig};
use meridian_api::auth::password::hash_password;
use meridian_api::config::ServerConfig;
use meridian_api::media::{MediaConfig, MediaResolver};
use meridian_api::routes;
use meridian_api::state::AppState;
use meridian_core::types::DbId;
use meridian_db::models::user::{CreateUser, User};
use meridian_db::repositories::UserRepo;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        media: MediaConfig {
            public_base_url: "http://media.local/bucket".to_string(),
            signing_secret: "test-media-secret".to_string(),
            signed_url_ttl_secs: 3600,
        },
    }
}

/// Build the full application router with all middleware layers, using
/// the given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let media = Arc::new(MediaResolver::new(config.media.clone()));

    let state = AppState {
        pool,
        config: Arc::new(config),
        media,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Create a user and return it with a valid Bearer token.
pub async fn seed_user_with_token(pool: &PgPool, email: &str) -> (User, String) {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash: hash_password("test-password-123").unwrap(),
            role: "student".to_string(),
            display_name: "Test Student".to_string(),
            career_goal: Some("backend".to_string()),
        },
    )
    .await
    .expect("user insert should succeed");

    let token = generate_access_token(user.id, &user.role, &test_config().jwt)
        .expect("token generation should succeed");

    (user, token)
}

/// Insert a course -> subject -> module chain and enroll the user.
/// Returns (course_id, subject_id, module_id).
pub async fn seed_enrolled_module(
    pool: &PgPool,
    user_id: DbId,
    course_title: &str,
) -> (DbId, DbId, DbId) {
    let (course_id,): (DbId,) =
        sqlx::query_as("INSERT INTO courses (title) VALUES ($1) RETURNING id")
            .bind(course_title)
            .fetch_one(pool)
            .await
            .unwrap();
    let (subject_id,): (DbId,) =
        sqlx::query_as("INSERT INTO subjects (course_id, title) VALUES ($1, 'subject') RETURNING id")
            .bind(course_id)
            .fetch_one(pool)
            .await
            .unwrap();
    let (module_id,): (DbId,) =
        sqlx::query_as("INSERT INTO modules (subject_id, title) VALUES ($1, 'module') RETURNING id")
            .bind(subject_id)
            .fetch_one(pool)
            .await
            .unwrap();
    sqlx::query("INSERT INTO enrollments (user_id, course_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(course_id)
        .execute(pool)
        .await
        .unwrap();

    (course_id, subject_id, module_id)
}

/// Insert one mcq question into a module; "right" is correct, "wrong"
/// is not. Returns the question id.
pub async fn seed_mcq(pool: &PgPool, module_id: DbId) -> DbId {
    let (question_id,): (DbId,) = sqlx::query_as(
        "INSERT INTO questions (module_id, question_type, prompt) \
         VALUES ($1, 'mcq', 'pick one') RETURNING id",
    )
    .bind(module_id)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO question_options (question_id, option_text, is_correct, position) \
         VALUES ($1, 'right', TRUE, 0), ($1, 'wrong', FALSE, 1)",
    )
    .bind(question_id)
    .execute(pool)
    .await
    .unwrap();

    question_id
}

/// Insert a learning-path template with one structure step and one
/// plain step. Returns the template id.
pub async fn seed_template(pool: &PgPool, career_goal: Option<&str>) -> DbId {
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO learning_paths (title, career_goal, steps) \
         VALUES ('Backend track', $1, \
             '[{\"title\": \"Orientation\", \"resource\": {\"type\": \"video\"}}, \
               {\"title\": \"Core modules\", \"resource\": {\"type\": \"course_structure\"}}]') \
         RETURNING id",
    )
    .bind(career_goal)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

/// Send a request and return (status, parsed JSON body).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response: Response<_> = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}
