//! Route definitions for the assessment flow.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::assessments;
use crate::state::AppState;

/// Routes mounted at `/assessments`.
///
/// ```text
/// POST /start                      -> start or resume
/// GET  /latest                     -> latest assessment
/// POST /evaluate                   -> score one answer (no persistence)
/// POST /{id}/finish                -> finalize and personalize
/// GET  /sessions/{id}              -> resume session state
/// POST /sessions/{id}/progress     -> save partial progress
/// POST /sessions/{id}/abandon      -> abandon session
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(assessments::start))
        .route("/latest", get(assessments::latest))
        .route("/evaluate", post(assessments::evaluate))
        .route("/{id}/finish", post(assessments::finish))
        .route("/sessions/{id}", get(assessments::get_session))
        .route("/sessions/{id}/progress", post(assessments::save_progress))
        .route("/sessions/{id}/abandon", post(assessments::abandon_session))
}
