//! Repository for the `assessments` table.

use meridian_core::types::DbId;
use sqlx::PgPool;

use crate::models::assessment::Assessment;

/// Column list for `assessments` queries.
const COLUMNS: &str = "id, user_id, started_at, completed_at, score, passed";

/// Provides CRUD operations for finalized assessment records.
pub struct AssessmentRepo;

impl AssessmentRepo {
    /// Insert a new assessment for a user.
    pub async fn create(pool: &PgPool, user_id: DbId) -> Result<Assessment, sqlx::Error> {
        let query = format!(
            "INSERT INTO assessments (user_id) \
             VALUES ($1) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Find an assessment by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Assessment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assessments WHERE id = $1");
        sqlx::query_as::<_, Assessment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The user's most recent assessment, finished or not.
    pub async fn find_latest_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Assessment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assessments \
             WHERE user_id = $1 \
             ORDER BY started_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Stamp completion data onto an assessment.
    pub async fn finalize(
        pool: &PgPool,
        id: DbId,
        score: i32,
        passed: bool,
    ) -> Result<Option<Assessment>, sqlx::Error> {
        let query = format!(
            "UPDATE assessments \
             SET completed_at = NOW(), score = $2, passed = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(id)
            .bind(score)
            .bind(passed)
            .fetch_optional(pool)
            .await
    }
}
