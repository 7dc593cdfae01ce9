//! Repository for the `personalized_learning_paths` table.

use meridian_core::types::DbId;
use sqlx::PgPool;

use crate::models::learning_path::PersonalizedLearningPath;

/// Column list for `personalized_learning_paths` queries.
const COLUMNS: &str = "id, user_id, learning_path_id, steps, course_structure, \
     module_distribution, created_at, updated_at";

/// Provides the one-row-per-user persistence contract for personalized
/// paths: update-if-exists, insert-otherwise, keyed on user id.
pub struct PersonalizedPathRepo;

impl PersonalizedPathRepo {
    /// Upsert the user's personalized path.
    pub async fn upsert_for_user(
        pool: &PgPool,
        user_id: DbId,
        learning_path_id: DbId,
        steps: &serde_json::Value,
        course_structure: &serde_json::Value,
        module_distribution: &serde_json::Value,
    ) -> Result<PersonalizedLearningPath, sqlx::Error> {
        let query = format!(
            "INSERT INTO personalized_learning_paths \
                 (user_id, learning_path_id, steps, course_structure, module_distribution) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 learning_path_id = EXCLUDED.learning_path_id, \
                 steps = EXCLUDED.steps, \
                 course_structure = EXCLUDED.course_structure, \
                 module_distribution = EXCLUDED.module_distribution, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PersonalizedLearningPath>(&query)
            .bind(user_id)
            .bind(learning_path_id)
            .bind(steps)
            .bind(course_structure)
            .bind(module_distribution)
            .fetch_one(pool)
            .await
    }

    /// The user's personalized path, if one has been generated.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<PersonalizedLearningPath>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM personalized_learning_paths WHERE user_id = $1"
        );
        sqlx::query_as::<_, PersonalizedLearningPath>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a personalized path by its own ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PersonalizedLearningPath>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM personalized_learning_paths WHERE id = $1");
        sqlx::query_as::<_, PersonalizedLearningPath>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
