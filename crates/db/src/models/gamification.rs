//! Gamification models: aggregate stats, XP ledger, activity calendar.

use chrono::NaiveDate;
use meridian_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_stats` table (one per user).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserStats {
    pub id: DbId,
    pub user_id: DbId,
    pub total_xp: i64,
    pub current_level: i32,
    pub tier: String,
    pub updated_at: Timestamp,
}

/// A row from the append-only `xp_events` ledger.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct XpEvent {
    pub id: DbId,
    pub user_id: DbId,
    pub question_id: Option<DbId>,
    pub attempt_number: i32,
    pub correct: bool,
    pub xp_awarded: i64,
    pub created_at: Timestamp,
}

/// A row from the `daily_activity` presence calendar.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DailyActivity {
    pub id: DbId,
    pub user_id: DbId,
    pub activity_date: NaiveDate,
    pub created_at: Timestamp,
}
