//! Assessment question and option models.

use meridian_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `questions` table.
///
/// Text-grading columns (`correct_answer`, `case_sensitive`,
/// `exact_match`, `alternate_answers`, `keywords`) are only meaningful
/// for `question_type = 'text'`; mcq questions grade via their options.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Question {
    pub id: DbId,
    pub module_id: DbId,
    pub question_type: String,
    pub prompt: String,
    pub image_path: Option<String>,
    pub points: i32,
    pub time_limit_secs: Option<i32>,
    pub difficulty: String,
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub correct_answer: Option<String>,
    #[serde(skip_serializing)]
    pub case_sensitive: bool,
    #[serde(skip_serializing)]
    pub exact_match: bool,
    #[serde(skip_serializing)]
    pub alternate_answers: Vec<String>,
    #[serde(skip_serializing)]
    pub keywords: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `question_options` table.
///
/// `is_correct` is never serialized to clients taking an assessment.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuestionOption {
    pub id: DbId,
    pub question_id: DbId,
    pub option_text: String,
    #[serde(skip_serializing)]
    pub is_correct: bool,
    pub position: i32,
}

/// DTO for creating a question.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestion {
    pub module_id: DbId,
    pub question_type: String,
    pub prompt: String,
    pub image_path: Option<String>,
    pub points: Option<i32>,
    pub time_limit_secs: Option<i32>,
    pub difficulty: Option<String>,
    pub correct_answer: Option<String>,
    pub case_sensitive: Option<bool>,
    pub exact_match: Option<bool>,
    pub alternate_answers: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
}

/// DTO for creating an mcq option.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestionOption {
    pub question_id: DbId,
    pub option_text: String,
    pub is_correct: bool,
    pub position: i32,
}
