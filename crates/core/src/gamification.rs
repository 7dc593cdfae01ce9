//! XP, level, and streak scoring primitives.
//!
//! The arithmetic kernel the assessment and learning-path machinery
//! depends on. All functions here are pure: the caller loads the user's
//! stats/activity calendar and passes them in.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::assessment::QuestionType;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Total-XP threshold at which the extra streak freeze is granted
/// regardless of tier.
pub const FREEZE_XP_THRESHOLD: i64 = 15_000;

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Question difficulty rating, stored on the question row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Parse a difficulty string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(CoreError::Validation(format!(
                "Invalid difficulty '{s}'. Must be one of: easy, medium, hard"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// User reward tier, stored on the `user_stats` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    /// Parse a tier string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "bronze" => Ok(Self::Bronze),
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            "platinum" => Ok(Self::Platinum),
            _ => Err(CoreError::Validation(format!(
                "Invalid tier '{s}'. Must be one of: bronze, silver, gold, platinum"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        }
    }
}

/// Number of consecutive absent days a streak forgives.
///
/// Bronze gets one freeze; every higher tier gets two. Users past
/// [`FREEZE_XP_THRESHOLD`] total XP get two regardless of tier.
pub fn freeze_allowance(tier: Tier, total_xp: i64) -> u32 {
    if total_xp >= FREEZE_XP_THRESHOLD {
        return 2;
    }
    match tier {
        Tier::Bronze => 1,
        Tier::Silver | Tier::Gold | Tier::Platinum => 2,
    }
}

// ---------------------------------------------------------------------------
// XP configuration
// ---------------------------------------------------------------------------

/// Tunable XP and level parameters.
#[derive(Debug, Clone)]
pub struct XpConfig {
    /// Base XP for a correct first-attempt answer, by difficulty.
    pub easy_xp: i64,
    pub medium_xp: i64,
    pub hard_xp: i64,
    /// Multiplier applied to free-text questions (harder to answer than mcq).
    pub text_bonus_multiplier: f64,
    /// Fraction of base XP awarded on the second attempt.
    pub retry_multiplier: f64,
    /// Base increment of the triangular level progression.
    pub level_base_increment: f64,
}

impl Default for XpConfig {
    fn default() -> Self {
        Self {
            easy_xp: 10,
            medium_xp: 20,
            hard_xp: 30,
            text_bonus_multiplier: 1.5,
            retry_multiplier: 0.5,
            level_base_increment: 100.0,
        }
    }
}

impl XpConfig {
    /// Base XP for the given difficulty.
    pub fn base_xp(&self, difficulty: Difficulty) -> i64 {
        match difficulty {
            Difficulty::Easy => self.easy_xp,
            Difficulty::Medium => self.medium_xp,
            Difficulty::Hard => self.hard_xp,
        }
    }
}

// ---------------------------------------------------------------------------
// XP per attempt
// ---------------------------------------------------------------------------

/// XP earned for one answer attempt.
///
/// Full credit on attempt 1, `retry_multiplier` of the base on attempt 2,
/// and nothing from attempt 3 on. Incorrect attempts never earn XP.
pub fn xp_for_attempt(
    attempt_number: u32,
    is_correct: bool,
    difficulty: Difficulty,
    question_type: QuestionType,
    config: &XpConfig,
) -> i64 {
    if !is_correct || attempt_number >= 3 {
        return 0;
    }

    let mut xp = config.base_xp(difficulty) as f64;
    if question_type == QuestionType::Text {
        xp *= config.text_bonus_multiplier;
    }
    if attempt_number == 2 {
        xp *= config.retry_multiplier;
    }
    xp.round() as i64
}

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

/// Total XP required to reach `level`.
///
/// Triangular progression: `round(base * (L*(L+1)/2 - 1))` for L > 1,
/// and 0 for level 1 (everyone starts at level 1).
pub fn xp_to_reach_level(level: u32, config: &XpConfig) -> i64 {
    if level <= 1 {
        return 0;
    }
    let l = level as f64;
    (config.level_base_increment * (l * (l + 1.0) / 2.0 - 1.0)).round() as i64
}

/// The level a user with `total_xp` has reached.
///
/// The largest level whose threshold is at or below `total_xp`.
pub fn level_for_xp(total_xp: i64, config: &XpConfig) -> u32 {
    let mut level = 1;
    while xp_to_reach_level(level + 1, config) <= total_xp {
        level += 1;
    }
    level
}

// ---------------------------------------------------------------------------
// Streaks
// ---------------------------------------------------------------------------

/// Current streak length given the user's daily-presence calendar.
///
/// Walks backward day-by-day from the most recent present day. An absent
/// day consumes one freeze (when available) and still counts toward the
/// streak; the walk stops at the first absent day with no freezes left,
/// or once it passes the earliest recorded presence.
pub fn streak_with_freezes(presence: &[NaiveDate], freeze_allowance: u32) -> u32 {
    let days: BTreeSet<NaiveDate> = presence.iter().copied().collect();

    let (Some(&earliest), Some(&latest)) = (days.first(), days.last()) else {
        return 0;
    };

    let mut streak = 0;
    let mut freezes_left = freeze_allowance;
    let mut day = latest;

    loop {
        if days.contains(&day) {
            streak += 1;
        } else if freezes_left > 0 {
            freezes_left -= 1;
            streak += 1;
        } else {
            break;
        }

        let Some(prev) = day.checked_sub_days(Days::new(1)) else {
            break;
        };
        if prev < earliest {
            break;
        }
        day = prev;
    }

    streak
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // -- xp_for_attempt -------------------------------------------------------

    #[test]
    fn incorrect_attempt_earns_nothing() {
        let config = XpConfig::default();
        for attempt in 1..=5 {
            assert_eq!(
                xp_for_attempt(attempt, false, Difficulty::Hard, QuestionType::Mcq, &config),
                0
            );
        }
    }

    #[test]
    fn first_attempt_full_credit() {
        let config = XpConfig::default();
        assert_eq!(
            xp_for_attempt(1, true, Difficulty::Easy, QuestionType::Mcq, &config),
            10
        );
        assert_eq!(
            xp_for_attempt(1, true, Difficulty::Medium, QuestionType::Mcq, &config),
            20
        );
        assert_eq!(
            xp_for_attempt(1, true, Difficulty::Hard, QuestionType::Mcq, &config),
            30
        );
    }

    #[test]
    fn second_attempt_half_credit() {
        let config = XpConfig::default();
        assert_eq!(
            xp_for_attempt(2, true, Difficulty::Medium, QuestionType::Mcq, &config),
            10
        );
    }

    #[test]
    fn third_attempt_and_beyond_earns_nothing() {
        let config = XpConfig::default();
        assert_eq!(
            xp_for_attempt(3, true, Difficulty::Hard, QuestionType::Text, &config),
            0
        );
        assert_eq!(
            xp_for_attempt(10, true, Difficulty::Easy, QuestionType::Mcq, &config),
            0
        );
    }

    #[test]
    fn text_questions_earn_bonus() {
        let config = XpConfig::default();
        // 20 * 1.5 = 30
        assert_eq!(
            xp_for_attempt(1, true, Difficulty::Medium, QuestionType::Text, &config),
            30
        );
        // Second attempt: 20 * 1.5 * 0.5 = 15
        assert_eq!(
            xp_for_attempt(2, true, Difficulty::Medium, QuestionType::Text, &config),
            15
        );
    }

    // -- levels ---------------------------------------------------------------

    #[test]
    fn level_one_requires_no_xp() {
        let config = XpConfig::default();
        assert_eq!(xp_to_reach_level(1, &config), 0);
        assert_eq!(level_for_xp(0, &config), 1);
    }

    #[test]
    fn level_thresholds_follow_triangular_progression() {
        let config = XpConfig::default();
        // L=2: 100 * (3 - 1) = 200
        assert_eq!(xp_to_reach_level(2, &config), 200);
        // L=3: 100 * (6 - 1) = 500
        assert_eq!(xp_to_reach_level(3, &config), 500);
        // L=4: 100 * (10 - 1) = 900
        assert_eq!(xp_to_reach_level(4, &config), 900);
    }

    #[test]
    fn level_round_trips_through_threshold() {
        let config = XpConfig::default();
        for level in 1..=20 {
            let xp = xp_to_reach_level(level, &config);
            assert_eq!(level_for_xp(xp, &config), level);
        }
    }

    #[test]
    fn level_is_monotone_in_xp() {
        let config = XpConfig::default();
        let mut last = 0;
        for xp in (0..5_000).step_by(50) {
            let level = level_for_xp(xp, &config);
            assert!(level >= last, "level regressed at {xp} xp");
            last = level;
        }
    }

    #[test]
    fn xp_just_below_threshold_stays_on_previous_level() {
        let config = XpConfig::default();
        let threshold = xp_to_reach_level(3, &config);
        assert_eq!(level_for_xp(threshold - 1, &config), 2);
        assert_eq!(level_for_xp(threshold, &config), 3);
    }

    // -- freeze allowance -----------------------------------------------------

    #[test]
    fn bronze_gets_one_freeze() {
        assert_eq!(freeze_allowance(Tier::Bronze, 0), 1);
    }

    #[test]
    fn higher_tiers_get_two_freezes() {
        assert_eq!(freeze_allowance(Tier::Silver, 0), 2);
        assert_eq!(freeze_allowance(Tier::Gold, 0), 2);
        assert_eq!(freeze_allowance(Tier::Platinum, 0), 2);
    }

    #[test]
    fn high_xp_bronze_gets_two_freezes() {
        assert_eq!(freeze_allowance(Tier::Bronze, FREEZE_XP_THRESHOLD), 2);
    }

    // -- streaks --------------------------------------------------------------

    #[test]
    fn empty_calendar_has_no_streak() {
        assert_eq!(streak_with_freezes(&[], 2), 0);
    }

    #[test]
    fn unbroken_run_counts_every_day() {
        let days: Vec<NaiveDate> = (1..=5).map(|d| date(2025, 3, d)).collect();
        assert_eq!(streak_with_freezes(&days, 0), 5);
    }

    #[test]
    fn gap_covered_by_freeze_still_counts() {
        // Present on days 1, 2, 4, 5; day 3 absent. With freezes the
        // streak bridges the gap: 4 present + 1 frozen = 5.
        let days = vec![
            date(2025, 3, 1),
            date(2025, 3, 2),
            date(2025, 3, 4),
            date(2025, 3, 5),
        ];
        assert_eq!(streak_with_freezes(&days, 2), 5);
    }

    #[test]
    fn gap_without_freeze_resets() {
        let days = vec![
            date(2025, 3, 1),
            date(2025, 3, 2),
            date(2025, 3, 4),
            date(2025, 3, 5),
        ];
        assert_eq!(streak_with_freezes(&days, 0), 2);
    }

    #[test]
    fn two_day_gap_consumes_two_freezes() {
        let days = vec![date(2025, 3, 1), date(2025, 3, 4), date(2025, 3, 5)];
        assert_eq!(streak_with_freezes(&days, 2), 5);
        assert_eq!(streak_with_freezes(&days, 1), 2);
    }

    #[test]
    fn streak_never_extends_before_first_presence() {
        // A single present day with freezes available must not count
        // phantom days before the calendar began.
        let days = vec![date(2025, 3, 10)];
        assert_eq!(streak_with_freezes(&days, 2), 1);
    }

    #[test]
    fn duplicate_dates_are_deduplicated() {
        let days = vec![date(2025, 3, 5), date(2025, 3, 5), date(2025, 3, 4)];
        assert_eq!(streak_with_freezes(&days, 0), 2);
    }

    // -- enum round trips -----------------------------------------------------

    #[test]
    fn difficulty_round_trip() {
        for d in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(Difficulty::from_str_db(d.as_str()).unwrap(), d);
        }
        assert!(Difficulty::from_str_db("extreme").is_err());
    }

    #[test]
    fn tier_round_trip() {
        for t in [Tier::Bronze, Tier::Silver, Tier::Gold, Tier::Platinum] {
            assert_eq!(Tier::from_str_db(t.as_str()).unwrap(), t);
        }
        assert!(Tier::from_str_db("diamond").is_err());
    }
}
