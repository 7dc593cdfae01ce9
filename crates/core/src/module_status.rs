//! Per-module correctness aggregation and mandatory/optional
//! classification.
//!
//! Recomputed from the full durable response history every time a user
//! finishes an assessment; the computation is a pure function of its
//! inputs so repeated runs persist identical rows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Correctness percentage at or above which a module becomes optional.
pub const OPTIONAL_THRESHOLD_PCT: u32 = 90;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Whether a module must be completed in the learning path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleClassification {
    Mandatory,
    Optional,
}

impl ModuleClassification {
    /// Parse a classification string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "mandatory" => Ok(Self::Mandatory),
            "optional" => Ok(Self::Optional),
            _ => Err(CoreError::Validation(format!(
                "Invalid module status '{s}'. Must be one of: mandatory, optional"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mandatory => "mandatory",
            Self::Optional => "optional",
        }
    }
}

/// Classify a correctness percentage.
pub fn classify(percentage: u32) -> ModuleClassification {
    if percentage >= OPTIONAL_THRESHOLD_PCT {
        ModuleClassification::Optional
    } else {
        ModuleClassification::Mandatory
    }
}

// ---------------------------------------------------------------------------
// Score computation
// ---------------------------------------------------------------------------

/// One durable response row, reduced to what scoring needs.
#[derive(Debug, Clone)]
pub struct ModuleResponse {
    pub module_id: DbId,
    pub correct: bool,
    pub skipped: bool,
    pub answer: Option<String>,
}

impl ModuleResponse {
    /// A response counts only when it was actually answered.
    fn is_answered(&self) -> bool {
        !self.skipped
            && self
                .answer
                .as_deref()
                .is_some_and(|a| !a.trim().is_empty())
    }
}

/// Aggregated score for one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleScore {
    pub percentage: u32,
    pub classification: ModuleClassification,
}

/// Aggregate a user's response history into per-module scores.
///
/// Groups answered responses by module and computes a rounded
/// correctness percentage. Every assigned module missing from the
/// history is forced to `{0, mandatory}` -- a module is never optional
/// merely because it was never tested.
pub fn compute_module_scores(
    responses: &[ModuleResponse],
    assigned_module_ids: &[DbId],
) -> BTreeMap<DbId, ModuleScore> {
    let mut tallies: BTreeMap<DbId, (u32, u32)> = BTreeMap::new();

    for response in responses {
        if !response.is_answered() {
            continue;
        }
        let entry = tallies.entry(response.module_id).or_insert((0, 0));
        entry.1 += 1;
        if response.correct {
            entry.0 += 1;
        }
    }

    let mut scores: BTreeMap<DbId, ModuleScore> = tallies
        .into_iter()
        .map(|(module_id, (correct, total))| {
            let percentage = if total > 0 {
                (100.0 * correct as f64 / total as f64).round() as u32
            } else {
                0
            };
            (
                module_id,
                ModuleScore {
                    percentage,
                    classification: classify(percentage),
                },
            )
        })
        .collect();

    for &module_id in assigned_module_ids {
        scores.entry(module_id).or_insert(ModuleScore {
            percentage: 0,
            classification: ModuleClassification::Mandatory,
        });
    }

    scores
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn response(module_id: DbId, correct: bool) -> ModuleResponse {
        ModuleResponse {
            module_id,
            correct,
            skipped: false,
            answer: Some("an answer".into()),
        }
    }

    #[test]
    fn classification_round_trip() {
        for c in [ModuleClassification::Mandatory, ModuleClassification::Optional] {
            assert_eq!(ModuleClassification::from_str_db(c.as_str()).unwrap(), c);
        }
        assert!(ModuleClassification::from_str_db("required").is_err());
    }

    #[test]
    fn ninety_percent_is_optional() {
        let responses: Vec<ModuleResponse> = (0..10).map(|i| response(1, i != 0)).collect();
        let scores = compute_module_scores(&responses, &[1]);
        assert_eq!(
            scores[&1],
            ModuleScore {
                percentage: 90,
                classification: ModuleClassification::Optional
            }
        );
    }

    #[test]
    fn eighty_percent_is_mandatory() {
        let responses: Vec<ModuleResponse> = (0..10).map(|i| response(1, i >= 2)).collect();
        let scores = compute_module_scores(&responses, &[1]);
        assert_eq!(
            scores[&1],
            ModuleScore {
                percentage: 80,
                classification: ModuleClassification::Mandatory
            }
        );
    }

    #[test]
    fn unanswered_assigned_module_defaults_to_mandatory_zero() {
        let scores = compute_module_scores(&[], &[5]);
        assert_eq!(
            scores[&5],
            ModuleScore {
                percentage: 0,
                classification: ModuleClassification::Mandatory
            }
        );
    }

    #[test]
    fn skipped_and_blank_responses_are_ignored() {
        let responses = vec![
            response(1, true),
            ModuleResponse {
                module_id: 1,
                correct: false,
                skipped: true,
                answer: None,
            },
            ModuleResponse {
                module_id: 1,
                correct: false,
                skipped: false,
                answer: Some("  ".into()),
            },
        ];
        let scores = compute_module_scores(&responses, &[1]);
        // Only the answered response counts: 1/1 = 100%.
        assert_eq!(scores[&1].percentage, 100);
        assert_eq!(scores[&1].classification, ModuleClassification::Optional);
    }

    #[test]
    fn modules_with_responses_but_not_assigned_are_still_scored() {
        let responses = vec![response(3, true)];
        let scores = compute_module_scores(&responses, &[]);
        assert_eq!(scores[&3].percentage, 100);
    }

    #[test]
    fn computation_is_idempotent() {
        let responses = vec![response(1, true), response(1, false), response(2, true)];
        let first = compute_module_scores(&responses, &[1, 2, 3]);
        let second = compute_module_scores(&responses, &[1, 2, 3]);
        assert_eq!(first, second);
        assert_eq!(first[&1].percentage, 50);
        assert_eq!(first[&3].percentage, 0);
    }

    #[test]
    fn rounding_matches_nearest_integer() {
        // 2/3 = 66.67 -> 67.
        let responses = vec![response(1, true), response(1, true), response(1, false)];
        let scores = compute_module_scores(&responses, &[1]);
        assert_eq!(scores[&1].percentage, 67);
    }
}
