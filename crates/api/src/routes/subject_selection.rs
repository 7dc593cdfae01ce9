//! Route definitions for subject selection and the assessment skip.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::subject_selection;
use crate::state::AppState;

/// Routes mounted at `/subject-selection`.
///
/// ```text
/// GET  /          -> current selection
/// PUT  /          -> replace selection
/// GET  /options   -> selectable course/subject groups
/// POST /skip      -> decline assessment, seed mandatory statuses
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(subject_selection::get_selection).put(subject_selection::set_selection),
        )
        .route("/options", get(subject_selection::get_options))
        .route("/skip", post(subject_selection::skip_assessment))
}
