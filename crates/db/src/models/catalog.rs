//! Course catalog models: courses, subjects, modules, enrollments.

use meridian_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `courses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Course {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub career_goal: Option<String>,
    pub created_at: Timestamp,
}

/// A row from the `subjects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subject {
    pub id: DbId,
    pub course_id: DbId,
    pub title: String,
    pub position: i32,
}

/// A row from the `enrollments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Enrollment {
    pub id: DbId,
    pub user_id: DbId,
    pub course_id: DbId,
    pub created_at: Timestamp,
}

/// One course->subject->module row of a user's assigned catalog,
/// produced by joining enrollments down to modules.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssignedCatalogRow {
    pub course_id: DbId,
    pub course_title: String,
    pub subject_id: DbId,
    pub subject_title: String,
    pub module_id: DbId,
    pub module_title: String,
}

/// DTO for enrolling the authenticated user into a course.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollRequest {
    pub course_id: DbId,
}
