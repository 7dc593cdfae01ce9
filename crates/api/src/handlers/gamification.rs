//! Handlers for gamification: aggregate stats and practice-attempt XP.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use meridian_core::assessment::QuestionType;
use meridian_core::error::CoreError;
use meridian_core::gamification::{
    freeze_allowance, level_for_xp, streak_with_freezes, xp_for_attempt, Difficulty, Tier,
    XpConfig,
};
use meridian_core::types::DbId;
use meridian_db::repositories::{QuestionRepo, UserStatsRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /gamification/attempts`.
#[derive(Debug, Deserialize)]
pub struct RecordAttemptRequest {
    pub question_id: DbId,
    pub attempt_number: u32,
    pub correct: bool,
}

/// Response body for `GET /gamification/stats`.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_xp: i64,
    pub level: u32,
    pub tier: String,
    pub freeze_allowance: u32,
    pub current_streak: u32,
}

/// GET /api/v1/gamification/stats
///
/// Aggregate XP, level, tier, and the freeze-aware streak.
pub async fn stats(State(state): State<AppState>, user: AuthUser) -> AppResult<impl IntoResponse> {
    let stats = UserStatsRepo::get_or_create(&state.pool, user.user_id).await?;
    let tier = Tier::from_str_db(&stats.tier)?;
    let config = XpConfig::default();

    let allowance = freeze_allowance(tier, stats.total_xp);
    let presence = UserStatsRepo::activity_dates(&state.pool, user.user_id).await?;
    let current_streak = streak_with_freezes(&presence, allowance);

    Ok(Json(DataResponse {
        data: StatsResponse {
            total_xp: stats.total_xp,
            level: level_for_xp(stats.total_xp, &config),
            tier: stats.tier,
            freeze_allowance: allowance,
            current_streak,
        },
    }))
}

/// POST /api/v1/gamification/attempts
///
/// Record a practice attempt: XP per the diminishing-return rules,
/// ledger entry, level recompute, and today's presence mark.
pub async fn record_attempt(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<RecordAttemptRequest>,
) -> AppResult<impl IntoResponse> {
    if input.attempt_number == 0 {
        return Err(AppError::Core(CoreError::Validation(
            "attempt_number must be at least 1".into(),
        )));
    }

    let question = QuestionRepo::find_by_id(&state.pool, input.question_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Question",
            id: input.question_id,
        }))?;

    let difficulty = Difficulty::from_str_db(&question.difficulty)?;
    let question_type = QuestionType::from_str_db(&question.question_type)?;

    let config = XpConfig::default();
    let xp = xp_for_attempt(
        input.attempt_number,
        input.correct,
        difficulty,
        question_type,
        &config,
    );

    let current = UserStatsRepo::get_or_create(&state.pool, user.user_id).await?;
    let new_level = level_for_xp(current.total_xp + xp, &config) as i32;
    let stats = UserStatsRepo::add_xp(&state.pool, user.user_id, xp, new_level).await?;

    UserStatsRepo::insert_xp_event(
        &state.pool,
        user.user_id,
        Some(question.id),
        input.attempt_number as i32,
        input.correct,
        xp,
    )
    .await?;
    UserStatsRepo::record_activity(&state.pool, user.user_id, chrono::Utc::now().date_naive())
        .await?;

    tracing::info!(
        user_id = user.user_id,
        question_id = question.id,
        attempt = input.attempt_number,
        correct = input.correct,
        xp_awarded = xp,
        "Practice attempt recorded"
    );

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "xp_awarded": xp,
            "total_xp": stats.total_xp,
            "level": stats.current_level,
        }),
    }))
}
