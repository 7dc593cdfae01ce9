//! Repository for the `path_step_progress` table.

use meridian_core::types::DbId;
use sqlx::PgPool;

use crate::models::learning_path::PathStepProgress;

/// Column list for `path_step_progress` queries.
const COLUMNS: &str = "id, user_id, step_index, completed_at";

/// Provides step-completion marks for the user's learning path.
pub struct PathProgressRepo;

impl PathProgressRepo {
    /// Mark a step complete. Re-completing a step refreshes the
    /// timestamp rather than duplicating the row.
    pub async fn complete_step(
        pool: &PgPool,
        user_id: DbId,
        step_index: i32,
    ) -> Result<PathStepProgress, sqlx::Error> {
        let query = format!(
            "INSERT INTO path_step_progress (user_id, step_index) \
             VALUES ($1, $2) \
             ON CONFLICT (user_id, step_index) DO UPDATE SET \
                 completed_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PathStepProgress>(&query)
            .bind(user_id)
            .bind(step_index)
            .fetch_one(pool)
            .await
    }

    /// All completed steps for a user in step order.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<PathStepProgress>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM path_step_progress \
             WHERE user_id = $1 \
             ORDER BY step_index"
        );
        sqlx::query_as::<_, PathStepProgress>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
