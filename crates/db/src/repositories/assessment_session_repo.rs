//! Repository for the `assessment_sessions` table.

use meridian_core::types::DbId;
use sqlx::PgPool;

use crate::models::assessment::AssessmentSession;

/// Column list for `assessment_sessions` queries.
const COLUMNS: &str = "id, assessment_id, user_id, current_position, status, created_at, updated_at";

/// Provides CRUD operations for resumable assessment sessions.
pub struct AssessmentSessionRepo;

impl AssessmentSessionRepo {
    /// Insert a new in-progress session at position 0.
    pub async fn create(
        pool: &PgPool,
        assessment_id: DbId,
        user_id: DbId,
    ) -> Result<AssessmentSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO assessment_sessions (assessment_id, user_id) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AssessmentSession>(&query)
            .bind(assessment_id)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Find a session by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<AssessmentSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assessment_sessions WHERE id = $1");
        sqlx::query_as::<_, AssessmentSession>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The session backing an assessment, if one was created.
    pub async fn find_by_assessment(
        pool: &PgPool,
        assessment_id: DbId,
    ) -> Result<Option<AssessmentSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assessment_sessions \
             WHERE assessment_id = $1 \
             ORDER BY created_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, AssessmentSession>(&query)
            .bind(assessment_id)
            .fetch_optional(pool)
            .await
    }

    /// The user's most recent in-progress session, if any.
    ///
    /// Concurrent starts can briefly leave more than one; the latest
    /// wins on every read.
    pub async fn find_latest_in_progress(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<AssessmentSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assessment_sessions \
             WHERE user_id = $1 AND status = 'in_progress' \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, AssessmentSession>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Advance the session's current position.
    pub async fn update_position(
        pool: &PgPool,
        id: DbId,
        current_position: i32,
    ) -> Result<Option<AssessmentSession>, sqlx::Error> {
        let query = format!(
            "UPDATE assessment_sessions \
             SET current_position = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AssessmentSession>(&query)
            .bind(id)
            .bind(current_position)
            .fetch_optional(pool)
            .await
    }

    /// Transition the session to a new status.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<AssessmentSession>, sqlx::Error> {
        let query = format!(
            "UPDATE assessment_sessions \
             SET status = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AssessmentSession>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }
}
