//! Handlers for subject selection and the assessment fast track.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use meridian_core::error::CoreError;
use meridian_core::types::DbId;
use meridian_db::models::catalog::{Course, Subject};
use meridian_db::repositories::{CatalogRepo, SubjectSelectionRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::personalization;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::tasks::best_effort;

/// Request body for `PUT /subject-selection`.
#[derive(Debug, Deserialize, Validate)]
pub struct SelectSubjectsRequest {
    #[validate(length(min = 1, message = "subject_ids must not be empty"))]
    pub subject_ids: Vec<DbId>,
}

/// One course with its selectable subjects.
#[derive(Debug, Serialize)]
pub struct CourseOptions {
    pub course: Course,
    pub subjects: Vec<Subject>,
}

/// GET /api/v1/subject-selection/options
///
/// The catalog as selectable course/subject groups.
pub async fn get_options(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let courses = CatalogRepo::list_courses(&state.pool).await?;

    let mut options = Vec::with_capacity(courses.len());
    for course in courses {
        let subjects = CatalogRepo::list_subjects(&state.pool, course.id).await?;
        options.push(CourseOptions { course, subjects });
    }

    Ok(Json(DataResponse { data: options }))
}

/// PUT /api/v1/subject-selection
///
/// Replace the user's subject scope for subsequent assessments.
pub async fn set_selection(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<SelectSubjectsRequest>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    SubjectSelectionRepo::replace_for_user(&state.pool, user.user_id, &input.subject_ids).await?;

    tracing::info!(
        user_id = user.user_id,
        subjects = input.subject_ids.len(),
        "Subject selection updated"
    );

    let selected = SubjectSelectionRepo::list_for_user(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: selected }))
}

/// GET /api/v1/subject-selection
pub async fn get_selection(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let selected = SubjectSelectionRepo::list_for_user(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: selected }))
}

/// POST /api/v1/subject-selection/skip
///
/// Fast track for beginners who decline the assessment: every assigned
/// module is seeded `mandatory / 0%` without consulting response
/// history, onboarding is marked complete, and whatever personalized
/// path now resolves is returned (possibly `null` when no template
/// exists yet).
pub async fn skip_assessment(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let seeded = personalization::seed_module_status_as_mandatory(&state.pool, user.user_id).await?;

    let account = UserRepo::set_onboarding_complete(&state.pool, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user.user_id,
        }))?;

    tracing::info!(
        user_id = user.user_id,
        modules_seeded = seeded,
        "Assessment skipped; onboarding fast-tracked"
    );

    // Same downstream contract as finishing an assessment.
    let learning_path = best_effort(
        "post-skip-path-refresh",
        personalization::refresh_user_learning_paths(&state.pool, user.user_id),
    )
    .await
    .flatten();

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "user": account,
            "modules_seeded": seeded,
            "learning_path": learning_path,
        }),
    }))
}
