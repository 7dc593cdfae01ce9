//! Repository for the `session_responses` table.

use meridian_core::types::DbId;
use sqlx::PgPool;

use crate::models::assessment::{SessionResponse, SessionResponseInput};

/// Column list for `session_responses` queries.
const COLUMNS: &str =
    "id, session_id, question_index, question_id, answer_text, skipped, created_at, updated_at";

/// Provides upsert-by-position persistence for in-progress answers.
pub struct SessionResponseRepo;

impl SessionResponseRepo {
    /// Upsert one response slot: insert for a new index, overwrite the
    /// existing row for a re-saved index.
    pub async fn upsert(
        pool: &PgPool,
        session_id: DbId,
        input: &SessionResponseInput,
    ) -> Result<SessionResponse, sqlx::Error> {
        let query = format!(
            "INSERT INTO session_responses (session_id, question_index, question_id, \
                 answer_text, skipped) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (session_id, question_index) DO UPDATE SET \
                 question_id = EXCLUDED.question_id, \
                 answer_text = EXCLUDED.answer_text, \
                 skipped = EXCLUDED.skipped, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SessionResponse>(&query)
            .bind(session_id)
            .bind(input.question_index)
            .bind(input.question_id)
            .bind(&input.answer)
            .bind(input.skipped)
            .fetch_one(pool)
            .await
    }

    /// All saved responses of a session in question order.
    pub async fn list_for_session(
        pool: &PgPool,
        session_id: DbId,
    ) -> Result<Vec<SessionResponse>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM session_responses \
             WHERE session_id = $1 \
             ORDER BY question_index"
        );
        sqlx::query_as::<_, SessionResponse>(&query)
            .bind(session_id)
            .fetch_all(pool)
            .await
    }
}
