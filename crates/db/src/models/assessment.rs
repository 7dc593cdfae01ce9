//! Assessment, session, and response models.
//!
//! A session (with its `session_responses`) is mutable, resumable
//! scratch state for an in-progress run; the `assessments` row plus its
//! `assessment_responses` ledger is the immutable record created once
//! the run is finished.

use meridian_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `assessments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Assessment {
    pub id: DbId,
    pub user_id: DbId,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub score: Option<i32>,
    pub passed: Option<bool>,
}

/// A row from the `assessment_sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssessmentSession {
    pub id: DbId,
    pub assessment_id: DbId,
    pub user_id: DbId,
    pub current_position: i32,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `session_responses` table: one per
/// (session, question_index), overwritten on re-save.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SessionResponse {
    pub id: DbId,
    pub session_id: DbId,
    pub question_index: i32,
    pub question_id: DbId,
    pub answer_text: Option<String>,
    pub skipped: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `assessment_responses` ledger.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssessmentResponse {
    pub id: DbId,
    pub assessment_id: DbId,
    pub user_id: DbId,
    pub question_id: DbId,
    pub module_id: DbId,
    pub answer_text: Option<String>,
    pub correct: bool,
    pub skipped: bool,
    pub created_at: Timestamp,
}

/// One response slot in a progress save.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionResponseInput {
    pub question_index: i32,
    pub question_id: DbId,
    pub answer: Option<String>,
    #[serde(default)]
    pub skipped: bool,
}

/// A graded response ready for the durable ledger.
#[derive(Debug, Clone)]
pub struct NewAssessmentResponse {
    pub question_id: DbId,
    pub module_id: DbId,
    pub answer_text: Option<String>,
    pub correct: bool,
    pub skipped: bool,
}
