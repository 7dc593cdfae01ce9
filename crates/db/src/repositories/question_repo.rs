//! Repository for the `questions` and `question_options` tables.

use meridian_core::types::DbId;
use sqlx::PgPool;

use crate::models::question::{CreateQuestion, CreateQuestionOption, Question, QuestionOption};

/// Column list for `questions` queries.
const COLUMNS: &str = "id, module_id, question_type, prompt, image_path, points, \
     time_limit_secs, difficulty, is_active, correct_answer, case_sensitive, \
     exact_match, alternate_answers, keywords, created_at, updated_at";

/// Column list for `question_options` queries.
const OPTION_COLUMNS: &str = "id, question_id, option_text, is_correct, position";

/// Provides CRUD operations for assessment questions.
pub struct QuestionRepo;

impl QuestionRepo {
    /// Insert a new question.
    pub async fn create(pool: &PgPool, input: &CreateQuestion) -> Result<Question, sqlx::Error> {
        let query = format!(
            "INSERT INTO questions (module_id, question_type, prompt, image_path, points, \
                 time_limit_secs, difficulty, correct_answer, case_sensitive, exact_match, \
                 alternate_answers, keywords) \
             VALUES ($1, $2, $3, $4, COALESCE($5, 1), $6, COALESCE($7, 'medium'), $8, \
                 COALESCE($9, FALSE), COALESCE($10, FALSE), \
                 COALESCE($11, ARRAY[]::text[]), COALESCE($12, ARRAY[]::text[])) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Question>(&query)
            .bind(input.module_id)
            .bind(&input.question_type)
            .bind(&input.prompt)
            .bind(&input.image_path)
            .bind(input.points)
            .bind(input.time_limit_secs)
            .bind(&input.difficulty)
            .bind(&input.correct_answer)
            .bind(input.case_sensitive)
            .bind(input.exact_match)
            .bind(&input.alternate_answers)
            .bind(&input.keywords)
            .fetch_one(pool)
            .await
    }

    /// Insert a new mcq option.
    pub async fn create_option(
        pool: &PgPool,
        input: &CreateQuestionOption,
    ) -> Result<QuestionOption, sqlx::Error> {
        let query = format!(
            "INSERT INTO question_options (question_id, option_text, is_correct, position) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {OPTION_COLUMNS}"
        );
        sqlx::query_as::<_, QuestionOption>(&query)
            .bind(input.question_id)
            .bind(&input.option_text)
            .bind(input.is_correct)
            .bind(input.position)
            .fetch_one(pool)
            .await
    }

    /// Find a question by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Question>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM questions WHERE id = $1");
        sqlx::query_as::<_, Question>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load a set of questions by ID, active or not.
    ///
    /// Used when grading a finish submission: answers are scored
    /// against the questions as they exist, even if deactivated since
    /// the session started.
    pub async fn list_by_ids(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<Question>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM questions WHERE id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, Question>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// List all active questions, ordered by module and ID for a stable
    /// question sequence.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Question>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM questions \
             WHERE is_active = TRUE AND question_type IN ('mcq', 'text') \
             ORDER BY module_id, id"
        );
        sqlx::query_as::<_, Question>(&query).fetch_all(pool).await
    }

    /// List active questions whose module belongs to one of the given
    /// subjects.
    pub async fn list_active_for_subjects(
        pool: &PgPool,
        subject_ids: &[DbId],
    ) -> Result<Vec<Question>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM questions q \
             WHERE q.is_active = TRUE AND q.question_type IN ('mcq', 'text') \
               AND q.module_id IN (SELECT id FROM modules WHERE subject_id = ANY($1)) \
             ORDER BY q.module_id, q.id"
        );
        sqlx::query_as::<_, Question>(&query)
            .bind(subject_ids)
            .fetch_all(pool)
            .await
    }

    /// Load the options of the given questions in display order.
    pub async fn options_for_questions(
        pool: &PgPool,
        question_ids: &[DbId],
    ) -> Result<Vec<QuestionOption>, sqlx::Error> {
        let query = format!(
            "SELECT {OPTION_COLUMNS} FROM question_options \
             WHERE question_id = ANY($1) \
             ORDER BY question_id, position, id"
        );
        sqlx::query_as::<_, QuestionOption>(&query)
            .bind(question_ids)
            .fetch_all(pool)
            .await
    }
}
