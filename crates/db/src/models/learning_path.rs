//! Learning-path template and personalized-copy models.

use meridian_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `learning_paths` table (a career-goal-tagged template).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LearningPath {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub career_goal: Option<String>,
    pub steps: serde_json::Value,
    pub created_at: Timestamp,
}

/// A row from the `personalized_learning_paths` table.
///
/// Exactly one per user; `course_structure` is the canonical merged
/// tree (used for re-merging on refresh), `steps` the template steps
/// with that tree substituted in, and `module_distribution` the debug
/// counts stamped on every write.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PersonalizedLearningPath {
    pub id: DbId,
    pub user_id: DbId,
    pub learning_path_id: DbId,
    pub steps: serde_json::Value,
    pub course_structure: serde_json::Value,
    pub module_distribution: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `path_step_progress` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PathStepProgress {
    pub id: DbId,
    pub user_id: DbId,
    pub step_index: i32,
    pub completed_at: Timestamp,
}

/// DTO for creating a learning-path template.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLearningPath {
    pub title: String,
    pub description: Option<String>,
    pub career_goal: Option<String>,
    pub steps: serde_json::Value,
}
