pub mod assessments;
pub mod auth;
pub mod gamification;
pub mod health;
pub mod learning_paths;
pub mod subject_selection;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                  login (public)
/// /auth/refresh                                refresh (public)
/// /auth/logout                                 logout (requires auth)
///
/// /assessments/start                           start or resume (POST)
/// /assessments/latest                          latest assessment (GET)
/// /assessments/evaluate                        score one answer (POST)
/// /assessments/{id}/finish                     finalize + personalize (POST)
/// /assessments/sessions/{id}                   resume session (GET)
/// /assessments/sessions/{id}/progress          save progress (POST)
/// /assessments/sessions/{id}/abandon           abandon session (POST)
///
/// /learning-paths                              list templates (GET)
/// /learning-paths/{id}                         template by id (GET)
/// /learning-paths/recommend                    recommended template (GET)
/// /learning-paths/personalized/{id}            personalized path by id (GET)
/// /learning-paths/my-path                      the user's path (GET)
/// /learning-paths/refresh                      re-personalize (POST)
/// /learning-paths/enroll                       enroll into course (POST)
/// /learning-paths/progress                     step progress (GET)
/// /learning-paths/steps/{index}/complete       complete step (POST)
/// /learning-paths/module-status                module status rows (GET)
/// /learning-paths/insights                     distribution stats (GET)
///
/// /subject-selection                           get, replace selection
/// /subject-selection/skip                      decline assessment (POST)
///
/// /gamification/stats                          XP/level/streak (GET)
/// /gamification/attempts                       record attempt (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication routes (login, refresh, logout).
        .nest("/auth", auth::router())
        // Adaptive assessment flow.
        .nest("/assessments", assessments::router())
        // Learning paths: templates and personalized copies.
        .nest("/learning-paths", learning_paths::router())
        // Subject scope and the onboarding fast track.
        .nest("/subject-selection", subject_selection::router())
        // XP, levels, streaks.
        .nest("/gamification", gamification::router())
}
