//! Route definitions for gamification.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::gamification;
use crate::state::AppState;

/// Routes mounted at `/gamification`.
///
/// ```text
/// GET  /stats     -> XP, level, tier, streak
/// POST /attempts  -> record a practice attempt
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(gamification::stats))
        .route("/attempts", post(gamification::record_attempt))
}
