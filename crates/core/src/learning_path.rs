//! Course-structure personalization and merging.
//!
//! The personalized learning path embeds a courses -> subjects ->
//! modules tree in which every module leaf carries the user's live
//! mandatory/optional status. All transforms here are immutable: they
//! take a tree and return a new tree, so regeneration is trivially
//! idempotent and never mutates caller state.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::module_status::{ModuleClassification, OPTIONAL_THRESHOLD_PCT};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Tree types
// ---------------------------------------------------------------------------

/// Per-module status echo embedded in each personalized leaf for
/// downstream consumers that only read the leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleStatusEcho {
    pub status: ModuleClassification,
    pub correctness_percentage: u32,
}

/// A module leaf in the course structure.
///
/// Freshly built leaves carry the default-safe annotations (mandatory,
/// unassigned, unscored); [`personalize_course_structure`] replaces
/// them with the user's live values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleLeaf {
    pub id: DbId,
    pub title: String,
    pub is_assigned: bool,
    pub is_mandatory: bool,
    pub status: ModuleClassification,
    pub assessment_score: Option<u32>,
    pub user_module_status: Option<ModuleStatusEcho>,
}

impl ModuleLeaf {
    /// A bare leaf with default-safe annotations.
    pub fn new(id: DbId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            is_assigned: false,
            is_mandatory: true,
            status: ModuleClassification::Mandatory,
            assessment_score: None,
            user_module_status: None,
        }
    }
}

/// A subject grouping module leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectNode {
    pub id: DbId,
    pub title: String,
    pub modules: Vec<ModuleLeaf>,
}

/// A course grouping subjects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseNode {
    pub id: DbId,
    pub title: String,
    pub subjects: Vec<SubjectNode>,
}

// ---------------------------------------------------------------------------
// Structure construction
// ---------------------------------------------------------------------------

/// One flat catalog row (course joined to subject joined to module),
/// as loaded from the user's enrolled courses.
#[derive(Debug, Clone)]
pub struct CatalogRow {
    pub course_id: DbId,
    pub course_title: String,
    pub subject_id: DbId,
    pub subject_title: String,
    pub module_id: DbId,
    pub module_title: String,
}

/// Build the nested tree from flat catalog rows.
///
/// Preserves first-seen order of courses, subjects, and modules (the
/// caller orders rows by position) and deduplicates module ids within
/// each subject.
pub fn build_course_structure(rows: &[CatalogRow]) -> Vec<CourseNode> {
    let mut courses: Vec<CourseNode> = Vec::new();

    for row in rows {
        let course_idx = courses
            .iter()
            .position(|c| c.id == row.course_id)
            .unwrap_or_else(|| {
                courses.push(CourseNode {
                    id: row.course_id,
                    title: row.course_title.clone(),
                    subjects: Vec::new(),
                });
                courses.len() - 1
            });
        let course = &mut courses[course_idx];

        let subject_idx = course
            .subjects
            .iter()
            .position(|s| s.id == row.subject_id)
            .unwrap_or_else(|| {
                course.subjects.push(SubjectNode {
                    id: row.subject_id,
                    title: row.subject_title.clone(),
                    modules: Vec::new(),
                });
                course.subjects.len() - 1
            });
        let subject = &mut course.subjects[subject_idx];

        if !subject.modules.iter().any(|m| m.id == row.module_id) {
            subject
                .modules
                .push(ModuleLeaf::new(row.module_id, row.module_title.clone()));
        }
    }

    courses
}

/// Collect every module id present in a structure.
pub fn collect_module_ids(structure: &[CourseNode]) -> BTreeSet<DbId> {
    structure
        .iter()
        .flat_map(|c| &c.subjects)
        .flat_map(|s| &s.modules)
        .map(|m| m.id)
        .collect()
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge a previously persisted structure with a freshly queried one.
///
/// Nothing a student has already seen may vanish from their path:
/// every course, subject, and module of `prior` survives the merge.
/// Fresh metadata wins where both sides carry a node; a subject whose
/// fresh module list is empty falls back to the prior list. A fully
/// empty `fresh` returns `prior` unchanged.
pub fn merge_course_structures(prior: &[CourseNode], fresh: &[CourseNode]) -> Vec<CourseNode> {
    if fresh.is_empty() {
        return prior.to_vec();
    }

    let mut merged: Vec<CourseNode> = Vec::new();

    for fresh_course in fresh {
        let prior_course = prior.iter().find(|c| c.id == fresh_course.id);
        merged.push(merge_course(prior_course, fresh_course));
    }

    // Prior-only courses are appended after the fresh set.
    for prior_course in prior {
        if !merged.iter().any(|c| c.id == prior_course.id) {
            merged.push(prior_course.clone());
        }
    }

    merged
}

fn merge_course(prior: Option<&CourseNode>, fresh: &CourseNode) -> CourseNode {
    let mut subjects: Vec<SubjectNode> = Vec::new();

    for fresh_subject in &fresh.subjects {
        let prior_subject =
            prior.and_then(|c| c.subjects.iter().find(|s| s.id == fresh_subject.id));
        subjects.push(merge_subject(prior_subject, fresh_subject));
    }

    if let Some(prior) = prior {
        for prior_subject in &prior.subjects {
            if !subjects.iter().any(|s| s.id == prior_subject.id) {
                subjects.push(prior_subject.clone());
            }
        }
    }

    CourseNode {
        id: fresh.id,
        title: fresh.title.clone(),
        subjects,
    }
}

fn merge_subject(prior: Option<&SubjectNode>, fresh: &SubjectNode) -> SubjectNode {
    // Fresh subject with no modules: keep whatever the user already had.
    if fresh.modules.is_empty() {
        if let Some(prior) = prior {
            return SubjectNode {
                id: fresh.id,
                title: fresh.title.clone(),
                modules: prior.modules.clone(),
            };
        }
    }

    let mut modules: Vec<ModuleLeaf> = Vec::new();
    for module in &fresh.modules {
        if !modules.iter().any(|m| m.id == module.id) {
            modules.push(module.clone());
        }
    }
    if let Some(prior) = prior {
        for module in &prior.modules {
            if !modules.iter().any(|m| m.id == module.id) {
                modules.push(module.clone());
            }
        }
    }

    SubjectNode {
        id: fresh.id,
        title: fresh.title.clone(),
        modules,
    }
}

// ---------------------------------------------------------------------------
// Personalization
// ---------------------------------------------------------------------------

/// Annotate every module leaf with the user's live status.
///
/// - Unassigned modules are mandatory (unscored content is never
///   skippable).
/// - Assigned modules with a known score are mandatory below
///   [`OPTIONAL_THRESHOLD_PCT`], optional at or above it.
/// - Assigned modules without a score default to mandatory.
pub fn personalize_course_structure(
    structure: &[CourseNode],
    assigned_module_ids: &BTreeSet<DbId>,
    module_scores: &BTreeMap<DbId, u32>,
) -> Vec<CourseNode> {
    structure
        .iter()
        .map(|course| CourseNode {
            id: course.id,
            title: course.title.clone(),
            subjects: course
                .subjects
                .iter()
                .map(|subject| SubjectNode {
                    id: subject.id,
                    title: subject.title.clone(),
                    modules: subject
                        .modules
                        .iter()
                        .map(|module| personalize_leaf(module, assigned_module_ids, module_scores))
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

fn personalize_leaf(
    module: &ModuleLeaf,
    assigned: &BTreeSet<DbId>,
    scores: &BTreeMap<DbId, u32>,
) -> ModuleLeaf {
    let is_assigned = assigned.contains(&module.id);
    let score = scores.get(&module.id).copied();

    let is_mandatory = match (is_assigned, score) {
        (false, _) => true,
        (true, Some(score)) => score < OPTIONAL_THRESHOLD_PCT,
        (true, None) => true,
    };

    let status = if is_mandatory {
        ModuleClassification::Mandatory
    } else {
        ModuleClassification::Optional
    };

    ModuleLeaf {
        id: module.id,
        title: module.title.clone(),
        is_assigned,
        is_mandatory,
        status,
        assessment_score: score,
        user_module_status: Some(ModuleStatusEcho {
            status,
            correctness_percentage: score.unwrap_or(0),
        }),
    }
}

// ---------------------------------------------------------------------------
// Distribution stats
// ---------------------------------------------------------------------------

/// Mandatory/optional counts for one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDistribution {
    pub course_id: DbId,
    pub course_title: String,
    pub mandatory: u32,
    pub optional: u32,
}

/// Module counts stamped alongside every persisted personalized path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDistribution {
    pub total_modules: u32,
    pub mandatory: u32,
    pub optional: u32,
    pub by_course: Vec<CourseDistribution>,
}

/// Count mandatory/optional modules overall and per course.
pub fn module_distribution(structure: &[CourseNode]) -> ModuleDistribution {
    let mut distribution = ModuleDistribution {
        total_modules: 0,
        mandatory: 0,
        optional: 0,
        by_course: Vec::new(),
    };

    for course in structure {
        let mut per_course = CourseDistribution {
            course_id: course.id,
            course_title: course.title.clone(),
            mandatory: 0,
            optional: 0,
        };
        for module in course.subjects.iter().flat_map(|s| &s.modules) {
            distribution.total_modules += 1;
            if module.is_mandatory {
                distribution.mandatory += 1;
                per_course.mandatory += 1;
            } else {
                distribution.optional += 1;
                per_course.optional += 1;
            }
        }
        distribution.by_course.push(per_course);
    }

    distribution
}

/// Whether any leaf in the structure is still mandatory.
pub fn has_mandatory_modules(structure: &[CourseNode]) -> bool {
    structure
        .iter()
        .flat_map(|c| &c.subjects)
        .flat_map(|s| &s.modules)
        .any(|m| m.is_mandatory)
}

// ---------------------------------------------------------------------------
// Template-step substitution
// ---------------------------------------------------------------------------

/// Resource type marker for steps that embed a course structure.
pub const RESOURCE_COURSE_STRUCTURE: &str = "course_structure";

/// Substitute a personalized structure into a template's step list.
///
/// Every step whose `resource.type` is `course_structure` gets the
/// structure written into `resource.course_structure`; any other step
/// is annotated with a flat `is_required` flag mirroring whether the
/// path still contains mandatory modules. Steps that are not JSON
/// objects pass through untouched.
pub fn personalize_steps(template_steps: &Value, structure: &[CourseNode], is_required: bool) -> Value {
    let structure_json =
        serde_json::to_value(structure).unwrap_or_else(|_| Value::Array(Vec::new()));

    let Some(steps) = template_steps.as_array() else {
        return template_steps.clone();
    };

    let personalized: Vec<Value> = steps
        .iter()
        .map(|step| {
            let Some(obj) = step.as_object() else {
                return step.clone();
            };
            let mut obj = obj.clone();

            let has_structure_resource = obj
                .get("resource")
                .and_then(|r| r.get("type"))
                .and_then(Value::as_str)
                == Some(RESOURCE_COURSE_STRUCTURE);

            if has_structure_resource {
                if let Some(resource) = obj.get_mut("resource").and_then(Value::as_object_mut) {
                    resource.insert("course_structure".to_string(), structure_json.clone());
                }
            } else {
                obj.insert("is_required".to_string(), Value::Bool(is_required));
            }

            Value::Object(obj)
        })
        .collect();

    Value::Array(personalized)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
