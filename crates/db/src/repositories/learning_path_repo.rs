//! Repository for the `learning_paths` template table.

use meridian_core::types::DbId;
use sqlx::PgPool;

use crate::models::learning_path::{CreateLearningPath, LearningPath};

/// Column list for `learning_paths` queries.
const COLUMNS: &str = "id, title, description, career_goal, steps, created_at";

/// Provides CRUD operations for learning-path templates.
pub struct LearningPathRepo;

impl LearningPathRepo {
    /// Insert a new template.
    pub async fn create(
        pool: &PgPool,
        input: &CreateLearningPath,
    ) -> Result<LearningPath, sqlx::Error> {
        let query = format!(
            "INSERT INTO learning_paths (title, description, career_goal, steps) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LearningPath>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.career_goal)
            .bind(&input.steps)
            .fetch_one(pool)
            .await
    }

    /// List templates, oldest first.
    pub async fn list(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LearningPath>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM learning_paths \
             ORDER BY id \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, LearningPath>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Find a template by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<LearningPath>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM learning_paths WHERE id = $1");
        sqlx::query_as::<_, LearningPath>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The template best matching a career goal: an exact goal match
    /// first, otherwise the oldest template as a general default.
    pub async fn find_best_match(
        pool: &PgPool,
        career_goal: Option<&str>,
    ) -> Result<Option<LearningPath>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM learning_paths \
             ORDER BY (career_goal = $1) DESC NULLS LAST, id \
             LIMIT 1"
        );
        sqlx::query_as::<_, LearningPath>(&query)
            .bind(career_goal)
            .fetch_optional(pool)
            .await
    }
}
