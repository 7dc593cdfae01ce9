//! Route definitions for learning paths.
//!
//! All endpoints require authentication. Literal segments are
//! registered before the `/{id}` matcher so `my-path`, `recommend`,
//! etc. never parse as path ids.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::learning_paths;
use crate::state::AppState;

/// Routes mounted at `/learning-paths`.
///
/// ```text
/// GET  /                           -> list templates
/// GET  /recommend                  -> best-matching template
/// GET  /my-path                    -> the user's personalized path
/// POST /refresh                    -> re-personalize in place
/// POST /enroll                     -> enroll into a course
/// GET  /progress                   -> step-completion summary
/// GET  /module-status              -> per-module status rows
/// GET  /insights                   -> distribution + completion stats
/// POST /steps/{index}/complete     -> mark a step complete
/// GET  /personalized/{id}          -> personalized path by id
/// GET  /{id}                       -> template by id
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(learning_paths::list_paths))
        .route("/recommend", get(learning_paths::recommend))
        .route("/my-path", get(learning_paths::my_path))
        .route("/refresh", post(learning_paths::refresh))
        .route("/enroll", post(learning_paths::enroll))
        .route("/progress", get(learning_paths::progress))
        .route("/module-status", get(learning_paths::module_status))
        .route("/insights", get(learning_paths::insights))
        .route("/steps/{index}/complete", post(learning_paths::complete_step))
        .route("/personalized/{id}", get(learning_paths::get_personalized))
        .route("/{id}", get(learning_paths::get_path))
}
