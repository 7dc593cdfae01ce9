//! Handlers for the assessment flow: start/resume, progress saves,
//! single-answer evaluation, finish, and session management.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use meridian_core::assessment::{
    evaluate_answer, incorrect_counts_by_module, locked_modules, score_responses,
    HistoricalResponse, McqOption, QuestionSpec, QuestionType, SessionStatus, SubmittedResponse,
    TextAnswerSpec,
};
use meridian_core::error::CoreError;
use meridian_core::types::DbId;
use meridian_db::models::assessment::{
    Assessment, AssessmentSession, NewAssessmentResponse, SessionResponseInput,
};
use meridian_db::models::learning_path::PersonalizedLearningPath;
use meridian_db::models::question::{Question, QuestionOption};
use meridian_db::repositories::{
    AssessmentRepo, AssessmentResponseRepo, AssessmentSessionRepo, QuestionRepo,
    SessionResponseRepo, SubjectSelectionRepo,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::personalization;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::tasks::best_effort;

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// One mcq option as exposed to the client (correctness withheld).
#[derive(Debug, Serialize)]
pub struct OptionPayload {
    pub id: DbId,
    pub text: String,
    pub position: i32,
}

/// One question of the active set.
#[derive(Debug, Serialize)]
pub struct QuestionPayload {
    pub id: DbId,
    pub module_id: DbId,
    pub question_type: String,
    pub prompt: String,
    pub image_url: Option<String>,
    pub points: i32,
    pub time_limit_secs: Option<i32>,
    pub difficulty: String,
    pub options: Vec<OptionPayload>,
}

/// A previously saved answer slot, keyed by question id on resume.
#[derive(Debug, Serialize)]
pub struct SavedResponse {
    pub answer: Option<String>,
    pub skipped: bool,
}

/// Resumable session state returned by start and resume.
#[derive(Debug, Serialize)]
pub struct SessionPayload {
    pub session_id: DbId,
    pub current_position: i32,
    pub responses: BTreeMap<DbId, SavedResponse>,
}

/// Response body for `POST /assessments/start`.
#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub assessment_id: DbId,
    pub questions: Vec<QuestionPayload>,
    pub locked_modules: Vec<DbId>,
    pub session: SessionPayload,
}

/// One entry of a finish submission, addressed by position.
#[derive(Debug, Deserialize, Serialize)]
pub struct FinishResponseItem {
    pub q_index: i32,
    pub question_id: DbId,
    pub answer: Option<String>,
    #[serde(default)]
    pub skipped: bool,
}

/// Request body for `POST /assessments/{id}/finish`.
#[derive(Debug, Deserialize, Validate)]
pub struct FinishRequest {
    #[validate(length(min = 1, message = "responses must not be empty"))]
    pub responses: Vec<FinishResponseItem>,
}

/// Response body for `POST /assessments/{id}/finish`.
#[derive(Debug, Serialize)]
pub struct FinishResponse {
    pub score: u32,
    pub passed: bool,
    pub total: usize,
    pub correct: usize,
    pub skipped: usize,
    pub assessment: Assessment,
    pub learning_path: Option<PersonalizedLearningPath>,
}

/// Request body for `POST /assessments/evaluate`.
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub question_id: DbId,
    pub answer: String,
}

/// Request body for `POST /assessments/sessions/{id}/progress`.
#[derive(Debug, Deserialize, Validate)]
pub struct SaveProgressRequest {
    #[validate(length(min = 1, message = "responses must not be empty"))]
    pub responses: Vec<SessionResponseInput>,
    /// Explicit new position; defaults to one past the highest saved index.
    pub current_position: Option<i32>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Modules locked for this user across all finished assessments.
async fn locked_modules_for_user(
    pool: &sqlx::PgPool,
    user_id: DbId,
) -> Result<BTreeSet<DbId>, sqlx::Error> {
    let history = AssessmentResponseRepo::list_for_user(pool, user_id).await?;
    let historical: Vec<HistoricalResponse> = history
        .iter()
        .map(|r| HistoricalResponse {
            module_id: r.module_id,
            correct: r.correct,
            skipped: r.skipped,
        })
        .collect();
    Ok(locked_modules(&incorrect_counts_by_module(&historical)))
}

/// Per-module incorrect counts seeding a finish pass.
async fn incorrect_counts_for_user(
    pool: &sqlx::PgPool,
    user_id: DbId,
) -> Result<HashMap<DbId, u32>, sqlx::Error> {
    let history = AssessmentResponseRepo::list_for_user(pool, user_id).await?;
    let historical: Vec<HistoricalResponse> = history
        .iter()
        .map(|r| HistoricalResponse {
            module_id: r.module_id,
            correct: r.correct,
            skipped: r.skipped,
        })
        .collect();
    Ok(incorrect_counts_by_module(&historical))
}

/// Build a grading snapshot from a question row and its options.
fn question_spec(question: &Question, options: &[QuestionOption]) -> AppResult<QuestionSpec> {
    let question_type = QuestionType::from_str_db(&question.question_type)?;

    let mcq_options: Vec<McqOption> = options
        .iter()
        .filter(|o| o.question_id == question.id)
        .map(|o| McqOption {
            text: o.option_text.clone(),
            correct: o.is_correct,
        })
        .collect();

    let text_spec = match question_type {
        QuestionType::Text => Some(TextAnswerSpec {
            correct_answer: question.correct_answer.clone().unwrap_or_default(),
            case_sensitive: question.case_sensitive,
            exact_match: question.exact_match,
            alternate_answers: question.alternate_answers.clone(),
            keywords: question.keywords.clone(),
        }),
        QuestionType::Mcq => None,
    };

    Ok(QuestionSpec {
        id: question.id,
        module_id: question.module_id,
        question_type,
        options: mcq_options,
        text_spec,
    })
}

/// Load the user's active question set: subject-scoped when selections
/// exist, minus locked modules, with image URLs resolved.
async fn build_question_set(
    state: &AppState,
    user_id: DbId,
    locked: &BTreeSet<DbId>,
) -> AppResult<Vec<QuestionPayload>> {
    let selections = SubjectSelectionRepo::list_for_user(&state.pool, user_id).await?;

    let questions = if selections.is_empty() {
        QuestionRepo::list_active(&state.pool).await?
    } else {
        QuestionRepo::list_active_for_subjects(&state.pool, &selections).await?
    };

    let questions: Vec<Question> = questions
        .into_iter()
        .filter(|q| !locked.contains(&q.module_id))
        .collect();

    let ids: Vec<DbId> = questions.iter().map(|q| q.id).collect();
    let options = QuestionRepo::options_for_questions(&state.pool, &ids).await?;

    let mut payloads = Vec::with_capacity(questions.len());
    for question in questions {
        let image_url = match &question.image_path {
            Some(path) => Some(state.media.resolve(path).await),
            None => None,
        };
        payloads.push(QuestionPayload {
            id: question.id,
            module_id: question.module_id,
            question_type: question.question_type.clone(),
            prompt: question.prompt.clone(),
            image_url,
            points: question.points,
            time_limit_secs: question.time_limit_secs,
            difficulty: question.difficulty.clone(),
            options: options
                .iter()
                .filter(|o| o.question_id == question.id)
                .map(|o| OptionPayload {
                    id: o.id,
                    text: o.option_text.clone(),
                    position: o.position,
                })
                .collect(),
        });
    }

    Ok(payloads)
}

/// Convert a session's saved responses into the resume map.
async fn session_payload(
    pool: &sqlx::PgPool,
    session: &AssessmentSession,
) -> Result<SessionPayload, sqlx::Error> {
    let saved = SessionResponseRepo::list_for_session(pool, session.id).await?;
    let responses = saved
        .into_iter()
        .map(|r| {
            (
                r.question_id,
                SavedResponse {
                    answer: r.answer_text,
                    skipped: r.skipped,
                },
            )
        })
        .collect();

    Ok(SessionPayload {
        session_id: session.id,
        current_position: session.current_position,
        responses,
    })
}

/// Load a session and check ownership.
async fn owned_session(
    pool: &sqlx::PgPool,
    session_id: DbId,
    user_id: DbId,
) -> AppResult<AssessmentSession> {
    let session = AssessmentSessionRepo::find_by_id(pool, session_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "AssessmentSession",
            id: session_id,
        }))?;

    if session.user_id != user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Session belongs to another user".into(),
        )));
    }

    Ok(session)
}

// ---------------------------------------------------------------------------
// POST /assessments/start
// ---------------------------------------------------------------------------

/// Start a new assessment or resume the user's in-progress session.
///
/// When an in-progress session exists (latest wins) it is returned with
/// its saved `question_id -> {answer, skipped}` map; otherwise a new
/// assessment + session is created at position 0.
pub async fn start(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let locked = locked_modules_for_user(&state.pool, user.user_id).await?;
    let questions = build_question_set(&state, user.user_id, &locked).await?;

    let (assessment_id, session) =
        match AssessmentSessionRepo::find_latest_in_progress(&state.pool, user.user_id).await? {
            Some(session) => {
                tracing::info!(
                    user_id = user.user_id,
                    session_id = session.id,
                    position = session.current_position,
                    "Resuming in-progress assessment session"
                );
                (session.assessment_id, session)
            }
            None => {
                let assessment = AssessmentRepo::create(&state.pool, user.user_id).await?;
                let session =
                    AssessmentSessionRepo::create(&state.pool, assessment.id, user.user_id).await?;
                tracing::info!(
                    user_id = user.user_id,
                    assessment_id = assessment.id,
                    session_id = session.id,
                    "Assessment started"
                );
                (assessment.id, session)
            }
        };

    let session = session_payload(&state.pool, &session).await?;

    Ok(Json(DataResponse {
        data: StartResponse {
            assessment_id,
            questions,
            locked_modules: locked.into_iter().collect(),
            session,
        },
    }))
}

// ---------------------------------------------------------------------------
// GET /assessments/latest
// ---------------------------------------------------------------------------

/// The user's most recent assessment, with its durable responses when
/// it has been finished.
pub async fn latest(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let assessment = AssessmentRepo::find_latest_for_user(&state.pool, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Assessment",
            id: user.user_id,
        }))?;

    let responses =
        AssessmentResponseRepo::list_for_assessment(&state.pool, assessment.id).await?;

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "assessment": assessment,
            "responses": responses,
        }),
    }))
}

// ---------------------------------------------------------------------------
// POST /assessments/evaluate
// ---------------------------------------------------------------------------

/// Score a single answer without persisting anything (live feedback).
pub async fn evaluate(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(input): Json<EvaluateRequest>,
) -> AppResult<impl IntoResponse> {
    let question = QuestionRepo::find_by_id(&state.pool, input.question_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Question",
            id: input.question_id,
        }))?;
    let options = QuestionRepo::options_for_questions(&state.pool, &[question.id]).await?;
    let spec = question_spec(&question, &options)?;

    let correct = evaluate_answer(&spec, input.answer.trim());

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "question_id": question.id,
            "correct": correct,
        }),
    }))
}

// ---------------------------------------------------------------------------
// POST /assessments/{id}/finish
// ---------------------------------------------------------------------------

/// Finalize an assessment run.
///
/// Re-evaluates the full ordered response list (module locks
/// accumulating left-to-right, seeded from history), persists the
/// durable response ledger, stamps the assessment row, and then runs
/// the best-effort personalization chain. The score/pass result is
/// returned even if every trailer step fails.
pub async fn finish(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<FinishRequest>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let assessment = AssessmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Assessment",
            id,
        }))?;

    if assessment.user_id != user.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Assessment belongs to another user".into(),
        )));
    }
    if assessment.completed_at.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "Assessment is already completed".into(),
        )));
    }

    // Order the submission by position and snapshot the questions.
    let mut items: Vec<&FinishResponseItem> = input.responses.iter().collect();
    items.sort_by_key(|r| r.q_index);

    let ids: Vec<DbId> = items.iter().map(|r| r.question_id).collect();
    let questions = QuestionRepo::list_by_ids(&state.pool, &ids).await?;
    let options = QuestionRepo::options_for_questions(&state.pool, &ids).await?;

    let mut specs: HashMap<DbId, QuestionSpec> = HashMap::with_capacity(questions.len());
    for question in &questions {
        specs.insert(question.id, question_spec(question, &options)?);
    }
    for item in &items {
        if !specs.contains_key(&item.question_id) {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "Question",
                id: item.question_id,
            }));
        }
    }

    let submitted: Vec<SubmittedResponse> = items
        .iter()
        .map(|r| SubmittedResponse {
            question_id: r.question_id,
            answer: r.answer.clone(),
            skipped: r.skipped,
        })
        .collect();

    let initial_incorrect = incorrect_counts_for_user(&state.pool, user.user_id).await?;
    let summary = score_responses(&submitted, &specs, &initial_incorrect);

    // Persist the durable ledger and stamp the assessment row.
    let ledger: Vec<NewAssessmentResponse> = summary
        .responses
        .iter()
        .map(|r| NewAssessmentResponse {
            question_id: r.question_id,
            module_id: r.module_id,
            answer_text: r.answer.clone(),
            correct: r.correct,
            skipped: r.skipped,
        })
        .collect();
    AssessmentResponseRepo::insert_batch(&state.pool, assessment.id, user.user_id, &ledger).await?;

    let assessment = AssessmentRepo::finalize(
        &state.pool,
        assessment.id,
        summary.score as i32,
        summary.passed,
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Assessment",
        id,
    }))?;

    if let Some(session) =
        AssessmentSessionRepo::find_by_assessment(&state.pool, assessment.id).await?
    {
        if SessionStatus::from_str_db(&session.status)?.is_active() {
            AssessmentSessionRepo::update_status(
                &state.pool,
                session.id,
                SessionStatus::Completed.as_str(),
            )
            .await?;
        }
    }

    tracing::info!(
        user_id = user.user_id,
        assessment_id = assessment.id,
        score = summary.score,
        passed = summary.passed,
        counted = summary.counted,
        skipped = summary.skipped,
        "Assessment finished"
    );

    // Best-effort trailer chain: status resync, then path
    // generation/refresh. Failures are logged and swallowed.
    best_effort(
        "module-status-sync",
        personalization::sync_module_status(&state.pool, user.user_id),
    )
    .await;

    let learning_path = best_effort(
        "learning-path-refresh",
        personalization::refresh_user_learning_paths(&state.pool, user.user_id),
    )
    .await
    .flatten();

    Ok(Json(DataResponse {
        data: FinishResponse {
            score: summary.score,
            passed: summary.passed,
            total: summary.counted,
            correct: summary.correct,
            skipped: summary.skipped,
            assessment,
            learning_path,
        },
    }))
}

// ---------------------------------------------------------------------------
// Session endpoints
// ---------------------------------------------------------------------------

/// GET /api/v1/assessments/sessions/{id}
///
/// Resume: the session with its saved response map.
pub async fn get_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let session = owned_session(&state.pool, id, user.user_id).await?;
    let payload = session_payload(&state.pool, &session).await?;
    Ok(Json(DataResponse { data: payload }))
}

/// POST /api/v1/assessments/sessions/{id}/progress
///
/// Upsert response slots by (session, question_index) and advance the
/// session position.
pub async fn save_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<SaveProgressRequest>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let session = owned_session(&state.pool, id, user.user_id).await?;
    if !SessionStatus::from_str_db(&session.status)?.is_active() {
        return Err(AppError::Core(CoreError::Conflict(
            "Session is no longer in progress".into(),
        )));
    }

    for response in &input.responses {
        SessionResponseRepo::upsert(&state.pool, session.id, response).await?;
    }

    let new_position = input.current_position.unwrap_or_else(|| {
        input
            .responses
            .iter()
            .map(|r| r.question_index + 1)
            .max()
            .unwrap_or(session.current_position)
    });
    let session = AssessmentSessionRepo::update_position(&state.pool, session.id, new_position)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "AssessmentSession",
            id,
        }))?;

    tracing::info!(
        user_id = user.user_id,
        session_id = session.id,
        saved = input.responses.len(),
        position = session.current_position,
        "Session progress saved"
    );

    let payload = session_payload(&state.pool, &session).await?;
    Ok(Json(DataResponse { data: payload }))
}

/// POST /api/v1/assessments/sessions/{id}/abandon
///
/// Terminal transition: an abandoned session can never be resumed.
pub async fn abandon_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let session = owned_session(&state.pool, id, user.user_id).await?;
    if !SessionStatus::from_str_db(&session.status)?.is_active() {
        return Err(AppError::Core(CoreError::Conflict(
            "Session is no longer in progress".into(),
        )));
    }

    let session = AssessmentSessionRepo::update_status(
        &state.pool,
        session.id,
        SessionStatus::Abandoned.as_str(),
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "AssessmentSession",
        id,
    }))?;

    tracing::info!(user_id = user.user_id, session_id = session.id, "Session abandoned");

    Ok(Json(DataResponse { data: session }))
}
