//! Learning-path personalization orchestration.
//!
//! Sequences the repositories and the pure core transforms: module
//! status resync after a finished assessment, personalized-path
//! generation from the best-matching template, and in-place refresh of
//! the user's stored path. Every function here is safe to call
//! repeatedly; all writes are keyed upserts.

use std::collections::{BTreeMap, BTreeSet};

use meridian_core::error::CoreError;
use meridian_core::learning_path::{
    build_course_structure, collect_module_ids, has_mandatory_modules, merge_course_structures,
    module_distribution, personalize_course_structure, personalize_steps, CatalogRow, CourseNode,
};
use meridian_core::module_status::{compute_module_scores, ModuleClassification, ModuleResponse};
use meridian_core::types::DbId;
use meridian_db::models::learning_path::{LearningPath, PersonalizedLearningPath};
use meridian_db::repositories::{
    AssessmentResponseRepo, CatalogRepo, LearningPathRepo, ModuleStatusRepo, PersonalizedPathRepo,
    UserRepo,
};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};

// ---------------------------------------------------------------------------
// Module status
// ---------------------------------------------------------------------------

/// Recompute and persist the user's per-module scores from their full
/// durable response history.
///
/// Returns the `module id -> percentage` map consumed by the path
/// personalization. Idempotent: identical history yields identical
/// persisted rows.
pub async fn sync_module_status(
    pool: &PgPool,
    user_id: DbId,
) -> AppResult<BTreeMap<DbId, u32>> {
    let history = AssessmentResponseRepo::list_for_user(pool, user_id).await?;
    let responses: Vec<ModuleResponse> = history
        .into_iter()
        .map(|r| ModuleResponse {
            module_id: r.module_id,
            correct: r.correct,
            skipped: r.skipped,
            answer: r.answer_text,
        })
        .collect();

    let assigned = CatalogRepo::assigned_module_ids(pool, user_id).await?;
    let scores = compute_module_scores(&responses, &assigned);

    for (module_id, score) in &scores {
        ModuleStatusRepo::upsert(
            pool,
            user_id,
            *module_id,
            score.percentage as i32,
            score.classification.as_str(),
        )
        .await?;
    }

    tracing::info!(
        user_id,
        modules = scores.len(),
        "Module status recomputed"
    );

    Ok(scores
        .into_iter()
        .map(|(id, score)| (id, score.percentage))
        .collect())
}

/// Seed every assigned module as `mandatory / 0%` without consulting
/// response history. Used by the subject-selection fast track for users
/// who decline the assessment.
pub async fn seed_module_status_as_mandatory(pool: &PgPool, user_id: DbId) -> AppResult<usize> {
    let assigned = CatalogRepo::assigned_module_ids(pool, user_id).await?;
    for module_id in &assigned {
        ModuleStatusRepo::upsert(
            pool,
            user_id,
            *module_id,
            0,
            ModuleClassification::Mandatory.as_str(),
        )
        .await?;
    }
    tracing::info!(user_id, modules = assigned.len(), "Module status seeded as mandatory");
    Ok(assigned.len())
}

// ---------------------------------------------------------------------------
// Path generation and refresh
// ---------------------------------------------------------------------------

/// The user's personalized path, generating one when none exists yet.
pub async fn resolve_or_generate(
    pool: &PgPool,
    user_id: DbId,
) -> AppResult<Option<PersonalizedLearningPath>> {
    if let Some(existing) = PersonalizedPathRepo::find_by_user(pool, user_id).await? {
        return Ok(Some(existing));
    }
    generate_personalized_path(pool, user_id).await
}

/// Generate and persist a personalized path from the best-matching
/// template. Returns `None` when no template exists at all; callers
/// treat that as "retry later", not as an error.
pub async fn generate_personalized_path(
    pool: &PgPool,
    user_id: DbId,
) -> AppResult<Option<PersonalizedLearningPath>> {
    let user = UserRepo::find_by_id(pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))?;

    let Some(template) =
        LearningPathRepo::find_best_match(pool, user.career_goal.as_deref()).await?
    else {
        tracing::warn!(user_id, "No learning-path template available; skipping generation");
        return Ok(None);
    };

    let path = rebuild_and_persist(pool, user_id, &template, &[]).await?;
    Ok(Some(path))
}

/// Re-merge, rebuild, and re-personalize the user's stored path.
///
/// Modules already surfaced in the stored path are never dropped, even
/// when the user's course assignment has since changed. Generates a
/// fresh path from the recommended template when the user has none.
pub async fn refresh_user_learning_paths(
    pool: &PgPool,
    user_id: DbId,
) -> AppResult<Option<PersonalizedLearningPath>> {
    let Some(existing) = PersonalizedPathRepo::find_by_user(pool, user_id).await? else {
        return generate_personalized_path(pool, user_id).await;
    };

    let prior = parse_structure(&existing.course_structure);

    // Prefer the template the path was generated from; fall back to the
    // recommendation when it has been deleted since.
    let template = match LearningPathRepo::find_by_id(pool, existing.learning_path_id).await? {
        Some(template) => template,
        None => {
            let user = UserRepo::find_by_id(pool, user_id)
                .await?
                .ok_or(AppError::Core(CoreError::NotFound {
                    entity: "User",
                    id: user_id,
                }))?;
            match LearningPathRepo::find_best_match(pool, user.career_goal.as_deref()).await? {
                Some(template) => template,
                None => return Ok(Some(existing)),
            }
        }
    };

    let path = rebuild_and_persist(pool, user_id, &template, &prior).await?;
    Ok(Some(path))
}

/// Build, personalize, and upsert the user's path in one pass.
async fn rebuild_and_persist(
    pool: &PgPool,
    user_id: DbId,
    template: &LearningPath,
    prior: &[CourseNode],
) -> AppResult<PersonalizedLearningPath> {
    let rows = CatalogRepo::assigned_catalog_rows(pool, user_id).await?;
    let catalog_rows: Vec<CatalogRow> = rows
        .into_iter()
        .map(|r| CatalogRow {
            course_id: r.course_id,
            course_title: r.course_title,
            subject_id: r.subject_id,
            subject_title: r.subject_title,
            module_id: r.module_id,
            module_title: r.module_title,
        })
        .collect();
    let fresh = build_course_structure(&catalog_rows);

    let merged = merge_course_structures(prior, &fresh);

    let assigned: BTreeSet<DbId> = CatalogRepo::assigned_module_ids(pool, user_id)
        .await?
        .into_iter()
        .collect();

    let scores: BTreeMap<DbId, u32> = ModuleStatusRepo::list_for_user(pool, user_id)
        .await?
        .into_iter()
        .map(|row| (row.module_id, row.correctness_percentage.max(0) as u32))
        .collect();

    let personalized = personalize_course_structure(&merged, &assigned, &scores);
    let distribution = module_distribution(&personalized);
    let steps = personalize_steps(
        &template.steps,
        &personalized,
        has_mandatory_modules(&personalized),
    );

    let structure_json = serde_json::to_value(&personalized)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize course structure: {e}")))?;
    let distribution_json = serde_json::to_value(&distribution)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize distribution: {e}")))?;

    let path = PersonalizedPathRepo::upsert_for_user(
        pool,
        user_id,
        template.id,
        &steps,
        &structure_json,
        &distribution_json,
    )
    .await?;

    tracing::info!(
        user_id,
        template_id = template.id,
        modules = collect_module_ids(&personalized).len(),
        mandatory = distribution.mandatory,
        optional = distribution.optional,
        "Personalized learning path persisted"
    );

    Ok(path)
}

/// Parse a stored `course_structure` JSONB value back into the tree.
///
/// A malformed value degrades to an empty prior structure rather than
/// failing the refresh.
fn parse_structure(value: &serde_json::Value) -> Vec<CourseNode> {
    serde_json::from_value(value.clone()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Stored course structure failed to parse; treating as empty");
        Vec::new()
    })
}
