//! Handlers for learning paths: templates, the user's personalized
//! path, enrollment, step progress, module status, and insights.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use meridian_core::error::CoreError;
use meridian_core::pagination::{clamp_limit, clamp_offset};
use meridian_core::types::DbId;
use meridian_db::models::catalog::EnrollRequest;
use meridian_db::repositories::{
    CatalogRepo, LearningPathRepo, ModuleStatusRepo, PathProgressRepo, PersonalizedPathRepo,
    UserRepo,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::personalization;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::tasks::best_effort;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Pagination parameters for template listing.
#[derive(Debug, Deserialize)]
pub struct ListPathsParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Progress summary across the user's personalized path.
#[derive(Debug, Serialize)]
pub struct PathProgressSummary {
    pub total_steps: usize,
    pub completed_steps: usize,
    pub completion_pct: u32,
    pub completed_indices: Vec<i32>,
}

// ---------------------------------------------------------------------------
// Template endpoints
// ---------------------------------------------------------------------------

/// GET /api/v1/learning-paths
pub async fn list_paths(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<ListPathsParams>,
) -> AppResult<impl IntoResponse> {
    let paths = LearningPathRepo::list(
        &state.pool,
        clamp_limit(params.limit),
        clamp_offset(params.offset),
    )
    .await?;
    Ok(Json(DataResponse { data: paths }))
}

/// GET /api/v1/learning-paths/{id}
pub async fn get_path(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let path = LearningPathRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "LearningPath",
            id,
        }))?;
    Ok(Json(DataResponse { data: path }))
}

/// GET /api/v1/learning-paths/recommend
///
/// The template best matching the user's career goal.
pub async fn recommend(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let account = UserRepo::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user.user_id,
        }))?;

    let path = LearningPathRepo::find_best_match(&state.pool, account.career_goal.as_deref())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "LearningPath",
            id: 0,
        }))?;

    Ok(Json(DataResponse { data: path }))
}

// ---------------------------------------------------------------------------
// Personalized-path endpoints
// ---------------------------------------------------------------------------

/// GET /api/v1/learning-paths/personalized/{id}
pub async fn get_personalized(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let path = PersonalizedPathRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PersonalizedLearningPath",
            id,
        }))?;

    if path.user_id != user.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Personalized path belongs to another user".into(),
        )));
    }

    Ok(Json(DataResponse { data: path }))
}

/// GET /api/v1/learning-paths/my-path
///
/// The user's personalized path, generated on first access.
pub async fn my_path(State(state): State<AppState>, user: AuthUser) -> AppResult<impl IntoResponse> {
    let path = personalization::resolve_or_generate(&state.pool, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PersonalizedLearningPath",
            id: user.user_id,
        }))?;

    Ok(Json(DataResponse { data: path }))
}

/// POST /api/v1/learning-paths/refresh
///
/// Re-merge and re-personalize the user's stored path. The response
/// carries `null` when no template exists yet; callers retry later.
pub async fn refresh(State(state): State<AppState>, user: AuthUser) -> AppResult<impl IntoResponse> {
    let path = personalization::refresh_user_learning_paths(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: path }))
}

/// POST /api/v1/learning-paths/enroll
///
/// Enroll into a course and refresh the path to surface its modules.
pub async fn enroll(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<EnrollRequest>,
) -> AppResult<impl IntoResponse> {
    let course = CatalogRepo::find_course(&state.pool, input.course_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Course",
            id: input.course_id,
        }))?;

    let enrollment = CatalogRepo::enroll(&state.pool, user.user_id, course.id).await?;
    let newly_enrolled = enrollment.is_some();

    if newly_enrolled {
        tracing::info!(user_id = user.user_id, course_id = course.id, "User enrolled in course");
        // Surface the new modules; not fatal if it fails.
        best_effort(
            "post-enroll-path-refresh",
            personalization::refresh_user_learning_paths(&state.pool, user.user_id),
        )
        .await;
    }

    Ok((
        if newly_enrolled {
            StatusCode::CREATED
        } else {
            StatusCode::OK
        },
        Json(DataResponse {
            data: serde_json::json!({
                "course_id": course.id,
                "newly_enrolled": newly_enrolled,
            }),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Progress endpoints
// ---------------------------------------------------------------------------

/// GET /api/v1/learning-paths/progress
pub async fn progress(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let path = PersonalizedPathRepo::find_by_user(&state.pool, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PersonalizedLearningPath",
            id: user.user_id,
        }))?;

    let total_steps = path.steps.as_array().map(Vec::len).unwrap_or(0);
    let completed = PathProgressRepo::list_for_user(&state.pool, user.user_id).await?;
    let completed_indices: Vec<i32> = completed.iter().map(|p| p.step_index).collect();

    let completion_pct = if total_steps > 0 {
        (100.0 * completed_indices.len() as f64 / total_steps as f64).round() as u32
    } else {
        0
    };

    Ok(Json(DataResponse {
        data: PathProgressSummary {
            total_steps,
            completed_steps: completed_indices.len(),
            completion_pct: completion_pct.min(100),
            completed_indices,
        },
    }))
}

/// POST /api/v1/learning-paths/steps/{index}/complete
pub async fn complete_step(
    State(state): State<AppState>,
    user: AuthUser,
    Path(index): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let path = PersonalizedPathRepo::find_by_user(&state.pool, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PersonalizedLearningPath",
            id: user.user_id,
        }))?;

    let total_steps = path.steps.as_array().map(Vec::len).unwrap_or(0) as i32;
    if index < 0 || index >= total_steps {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Step index {index} is out of range (path has {total_steps} steps)"
        ))));
    }

    let progress = PathProgressRepo::complete_step(&state.pool, user.user_id, index).await?;
    tracing::info!(user_id = user.user_id, step_index = index, "Path step completed");

    Ok(Json(DataResponse { data: progress }))
}

/// GET /api/v1/learning-paths/module-status
pub async fn module_status(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let statuses = ModuleStatusRepo::list_for_user(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: statuses }))
}

/// GET /api/v1/learning-paths/insights
///
/// Aggregate view for dashboards: module distribution plus step
/// completion.
pub async fn insights(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let path = PersonalizedPathRepo::find_by_user(&state.pool, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PersonalizedLearningPath",
            id: user.user_id,
        }))?;

    let total_steps = path.steps.as_array().map(Vec::len).unwrap_or(0);
    let completed = PathProgressRepo::list_for_user(&state.pool, user.user_id).await?;
    let statuses = ModuleStatusRepo::list_for_user(&state.pool, user.user_id).await?;
    let mandatory_remaining = statuses.iter().filter(|s| s.status == "mandatory").count();

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "module_distribution": path.module_distribution,
            "total_steps": total_steps,
            "completed_steps": completed.len(),
            "mandatory_modules_remaining": mandatory_remaining,
            "tracked_modules": statuses.len(),
            "updated_at": path.updated_at,
        }),
    }))
}
