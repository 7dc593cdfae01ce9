//! Assessment grading and module-locking logic.
//!
//! The session rows themselves live in the database; this module owns
//! everything computable from pre-loaded data: per-question grading
//! (mcq option lookup, fuzzy text matching), the sequential scoring
//! pass over a finished response list, and the locked-module derivation
//! from historical responses.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum overall score (percent) for a passing assessment.
pub const PASS_THRESHOLD_PCT: u32 = 72;

/// Incorrect non-skipped answers in one module before it locks.
pub const MODULE_LOCK_INCORRECT_THRESHOLD: u32 = 2;

// ---------------------------------------------------------------------------
// Question type
// ---------------------------------------------------------------------------

/// Supported question kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    Text,
}

impl QuestionType {
    /// Parse a question type string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "mcq" => Ok(Self::Mcq),
            "text" => Ok(Self::Text),
            _ => Err(CoreError::Validation(format!(
                "Invalid question type '{s}'. Must be one of: mcq, text"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mcq => "mcq",
            Self::Text => "text",
        }
    }
}

// ---------------------------------------------------------------------------
// Session status
// ---------------------------------------------------------------------------

/// Lifecycle of an assessment session. `in_progress` is resumable;
/// the other two states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl SessionStatus {
    /// Parse a status string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "abandoned" => Ok(Self::Abandoned),
            _ => Err(CoreError::Validation(format!(
                "Invalid session status '{s}'. Must be one of: in_progress, completed, abandoned"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }

    /// Whether the session can still accept progress saves.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

// ---------------------------------------------------------------------------
// Grading specs
// ---------------------------------------------------------------------------

/// One mcq option in display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McqOption {
    pub text: String,
    pub correct: bool,
}

/// Grading rules for a free-text question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextAnswerSpec {
    /// The canonical correct answer.
    pub correct_answer: String,
    /// Compare case-sensitively.
    pub case_sensitive: bool,
    /// Require the submission to equal the canonical answer exactly.
    pub exact_match: bool,
    /// Additional accepted answers.
    pub alternate_answers: Vec<String>,
    /// Scoring keywords; half of them (rounded up) must appear.
    pub keywords: Vec<String>,
}

/// Scoring snapshot of one question. Answers are graded against this
/// snapshot, never against a live row that may have been edited since.
#[derive(Debug, Clone)]
pub struct QuestionSpec {
    pub id: DbId,
    pub module_id: DbId,
    pub question_type: QuestionType,
    pub options: Vec<McqOption>,
    pub text_spec: Option<TextAnswerSpec>,
}

// ---------------------------------------------------------------------------
// Single-answer grading
// ---------------------------------------------------------------------------

/// Grade an mcq submission by option-text lookup.
///
/// The first option whose text equals the submission decides
/// correctness, so multi-correct option sets resolve by display order.
/// A submission matching no option is incorrect.
pub fn evaluate_mcq(options: &[McqOption], submitted: &str) -> bool {
    options
        .iter()
        .find(|o| o.text == submitted)
        .map(|o| o.correct)
        .unwrap_or(false)
}

/// Grade a free-text submission against its [`TextAnswerSpec`].
///
/// Exact-match rules compare whole strings (case per the
/// `case_sensitive` flag).
/// Otherwise the submission is correct when it contains the canonical
/// answer, contains any alternate answer, or matches at least half
/// (rounded up) of the keyword list.
pub fn evaluate_text_answer(spec: &TextAnswerSpec, submitted: &str) -> bool {
    let norm = |s: &str| {
        if spec.case_sensitive {
            s.trim().to_string()
        } else {
            s.trim().to_lowercase()
        }
    };

    let submitted = norm(submitted);
    let correct = norm(&spec.correct_answer);

    if spec.exact_match {
        return submitted == correct;
    }

    if !correct.is_empty() && submitted.contains(&correct) {
        return true;
    }

    if spec
        .alternate_answers
        .iter()
        .any(|alt| !alt.trim().is_empty() && submitted.contains(&norm(alt)))
    {
        return true;
    }

    if !spec.keywords.is_empty() {
        let required = spec.keywords.len().div_ceil(2);
        let matched = spec
            .keywords
            .iter()
            .filter(|kw| submitted.contains(&norm(kw)))
            .count();
        return matched >= required;
    }

    false
}

/// Grade one submitted answer against its question snapshot.
pub fn evaluate_answer(question: &QuestionSpec, submitted: &str) -> bool {
    match question.question_type {
        QuestionType::Mcq => evaluate_mcq(&question.options, submitted),
        QuestionType::Text => question
            .text_spec
            .as_ref()
            .map(|spec| evaluate_text_answer(spec, submitted))
            .unwrap_or(false),
    }
}

// ---------------------------------------------------------------------------
// Module locking
// ---------------------------------------------------------------------------

/// One row of durable response history used for lock derivation.
#[derive(Debug, Clone)]
pub struct HistoricalResponse {
    pub module_id: DbId,
    pub correct: bool,
    pub skipped: bool,
}

/// Count incorrect non-skipped answers per module.
pub fn incorrect_counts_by_module(history: &[HistoricalResponse]) -> HashMap<DbId, u32> {
    let mut counts: HashMap<DbId, u32> = HashMap::new();
    for response in history {
        if !response.skipped && !response.correct {
            *counts.entry(response.module_id).or_insert(0) += 1;
        }
    }
    counts
}

/// Modules whose incorrect count has reached the lock threshold.
pub fn locked_modules(incorrect_counts: &HashMap<DbId, u32>) -> BTreeSet<DbId> {
    incorrect_counts
        .iter()
        .filter(|(_, &count)| count >= MODULE_LOCK_INCORRECT_THRESHOLD)
        .map(|(&module_id, _)| module_id)
        .collect()
}

// ---------------------------------------------------------------------------
// Full-submission scoring
// ---------------------------------------------------------------------------

/// One entry of the ordered response list submitted to finish.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedResponse {
    pub question_id: DbId,
    pub answer: Option<String>,
    #[serde(default)]
    pub skipped: bool,
}

/// A graded response, ready to persist as a durable ledger row.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredResponse {
    pub question_id: DbId,
    pub module_id: DbId,
    pub answer: Option<String>,
    pub correct: bool,
    pub skipped: bool,
}

/// Outcome of scoring a finished assessment run.
#[derive(Debug, Clone)]
pub struct ScoreSummary {
    /// Rounded percent of counted questions answered correctly.
    pub score: u32,
    pub passed: bool,
    /// All graded responses, in submission order.
    pub responses: Vec<ScoredResponse>,
    /// Questions that entered the denominator.
    pub counted: usize,
    pub correct: usize,
    pub skipped: usize,
    /// Modules locked after this pass (history plus this submission).
    pub locked_modules: BTreeSet<DbId>,
}

/// Grade an ordered response list.
///
/// The pass is strictly sequential: each incorrect answer feeds the
/// per-module incorrect counts, so two early wrong answers in a module
/// lock out that module's later questions within the same submission.
/// `initial_incorrect` seeds the counts from historical finished
/// assessments; responses to already-locked modules are forced to
/// `skipped = true, correct = false` regardless of the submitted
/// answer. Skipped questions never enter the score denominator.
pub fn score_responses(
    responses: &[SubmittedResponse],
    questions: &HashMap<DbId, QuestionSpec>,
    initial_incorrect: &HashMap<DbId, u32>,
) -> ScoreSummary {
    let mut incorrect = initial_incorrect.clone();
    let mut scored = Vec::with_capacity(responses.len());
    let mut counted = 0usize;
    let mut correct_count = 0usize;
    let mut skipped_count = 0usize;

    for response in responses {
        let Some(question) = questions.get(&response.question_id) else {
            // Question vanished between start and finish; keep the row
            // as a skipped placeholder so the ledger stays complete.
            scored.push(ScoredResponse {
                question_id: response.question_id,
                module_id: 0,
                answer: response.answer.clone(),
                correct: false,
                skipped: true,
            });
            skipped_count += 1;
            continue;
        };

        let module_locked = incorrect
            .get(&question.module_id)
            .is_some_and(|&count| count >= MODULE_LOCK_INCORRECT_THRESHOLD);

        let answer = response
            .answer
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty());

        let answer = match answer {
            Some(answer) if !module_locked && !response.skipped => answer,
            _ => {
                scored.push(ScoredResponse {
                    question_id: question.id,
                    module_id: question.module_id,
                    answer: response.answer.clone(),
                    correct: false,
                    skipped: true,
                });
                skipped_count += 1;
                continue;
            }
        };

        let is_correct = evaluate_answer(question, answer);
        counted += 1;
        if is_correct {
            correct_count += 1;
        } else {
            *incorrect.entry(question.module_id).or_insert(0) += 1;
        }

        scored.push(ScoredResponse {
            question_id: question.id,
            module_id: question.module_id,
            answer: response.answer.clone(),
            correct: is_correct,
            skipped: false,
        });
    }

    let score = if counted > 0 {
        (100.0 * correct_count as f64 / counted as f64).round() as u32
    } else {
        0
    };

    ScoreSummary {
        score,
        passed: score >= PASS_THRESHOLD_PCT,
        responses: scored,
        counted,
        correct: correct_count,
        skipped: skipped_count,
        locked_modules: locked_modules(&incorrect),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
