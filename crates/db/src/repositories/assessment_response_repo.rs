//! Repository for the durable `assessment_responses` ledger.

use meridian_core::types::DbId;
use sqlx::PgPool;

use crate::models::assessment::{AssessmentResponse, NewAssessmentResponse};

/// Column list for `assessment_responses` queries.
const COLUMNS: &str = "id, assessment_id, user_id, question_id, module_id, answer_text, \
     correct, skipped, created_at";

/// Provides batch insert and history reads for finished-assessment
/// responses.
pub struct AssessmentResponseRepo;

impl AssessmentResponseRepo {
    /// Insert all graded responses of one finished assessment in a
    /// single statement.
    pub async fn insert_batch(
        pool: &PgPool,
        assessment_id: DbId,
        user_id: DbId,
        responses: &[NewAssessmentResponse],
    ) -> Result<u64, sqlx::Error> {
        if responses.is_empty() {
            return Ok(0);
        }

        let question_ids: Vec<DbId> = responses.iter().map(|r| r.question_id).collect();
        let module_ids: Vec<DbId> = responses.iter().map(|r| r.module_id).collect();
        let answers: Vec<Option<String>> = responses.iter().map(|r| r.answer_text.clone()).collect();
        let correct: Vec<bool> = responses.iter().map(|r| r.correct).collect();
        let skipped: Vec<bool> = responses.iter().map(|r| r.skipped).collect();

        let result = sqlx::query(
            "INSERT INTO assessment_responses \
                 (assessment_id, user_id, question_id, module_id, answer_text, correct, skipped) \
             SELECT $1, $2, q, m, a, c, s \
             FROM UNNEST($3::bigint[], $4::bigint[], $5::text[], $6::bool[], $7::bool[]) \
                 AS t(q, m, a, c, s)",
        )
        .bind(assessment_id)
        .bind(user_id)
        .bind(&question_ids)
        .bind(&module_ids)
        .bind(&answers)
        .bind(&correct)
        .bind(&skipped)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// The user's full response history across all finished assessments.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<AssessmentResponse>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assessment_responses \
             WHERE user_id = $1 \
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, AssessmentResponse>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Responses belonging to one assessment.
    pub async fn list_for_assessment(
        pool: &PgPool,
        assessment_id: DbId,
    ) -> Result<Vec<AssessmentResponse>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assessment_responses \
             WHERE assessment_id = $1 \
             ORDER BY id"
        );
        sqlx::query_as::<_, AssessmentResponse>(&query)
            .bind(assessment_id)
            .fetch_all(pool)
            .await
    }
}
