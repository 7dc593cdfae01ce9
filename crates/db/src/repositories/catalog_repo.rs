//! Repository for the course catalog (courses, subjects, modules,
//! enrollments).

use meridian_core::types::DbId;
use sqlx::PgPool;

use crate::models::catalog::{AssignedCatalogRow, Course, Enrollment, Subject};

/// Column list for `courses` queries.
const COURSE_COLUMNS: &str = "id, title, description, career_goal, created_at";

/// Provides read access to the catalog and enrollment writes.
pub struct CatalogRepo;

impl CatalogRepo {
    /// List all courses, newest first.
    pub async fn list_courses(pool: &PgPool) -> Result<Vec<Course>, sqlx::Error> {
        let query = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at DESC");
        sqlx::query_as::<_, Course>(&query).fetch_all(pool).await
    }

    /// Find one course by ID.
    pub async fn find_course(pool: &PgPool, id: DbId) -> Result<Option<Course>, sqlx::Error> {
        let query = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1");
        sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List subjects of a course in display order.
    pub async fn list_subjects(pool: &PgPool, course_id: DbId) -> Result<Vec<Subject>, sqlx::Error> {
        sqlx::query_as::<_, Subject>(
            "SELECT id, course_id, title, position FROM subjects \
             WHERE course_id = $1 ORDER BY position, id",
        )
        .bind(course_id)
        .fetch_all(pool)
        .await
    }

    /// Enroll a user into a course. Idempotent: re-enrolling is a no-op.
    pub async fn enroll(
        pool: &PgPool,
        user_id: DbId,
        course_id: DbId,
    ) -> Result<Option<Enrollment>, sqlx::Error> {
        sqlx::query_as::<_, Enrollment>(
            "INSERT INTO enrollments (user_id, course_id) \
             VALUES ($1, $2) \
             ON CONFLICT (user_id, course_id) DO NOTHING \
             RETURNING id, user_id, course_id, created_at",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(pool)
        .await
    }

    /// IDs of every module assigned to the user via enrolled courses.
    pub async fn assigned_module_ids(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT m.id FROM modules m \
             JOIN subjects s ON s.id = m.subject_id \
             JOIN enrollments e ON e.course_id = s.course_id \
             WHERE e.user_id = $1 \
             ORDER BY m.id",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// The user's full assigned catalog as flat course->subject->module
    /// rows, ordered by display position at every level.
    pub async fn assigned_catalog_rows(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<AssignedCatalogRow>, sqlx::Error> {
        sqlx::query_as::<_, AssignedCatalogRow>(
            "SELECT c.id AS course_id, c.title AS course_title, \
                    s.id AS subject_id, s.title AS subject_title, \
                    m.id AS module_id, m.title AS module_title \
             FROM enrollments e \
             JOIN courses c ON c.id = e.course_id \
             JOIN subjects s ON s.course_id = c.id \
             JOIN modules m ON m.subject_id = s.id \
             WHERE e.user_id = $1 \
             ORDER BY c.id, s.position, s.id, m.position, m.id",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
