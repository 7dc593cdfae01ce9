//! Repository for the `user_stats`, `xp_events`, and `daily_activity`
//! tables.

use chrono::NaiveDate;
use meridian_core::types::DbId;
use sqlx::PgPool;

use crate::models::gamification::{UserStats, XpEvent};

/// Column list for `user_stats` queries.
const STATS_COLUMNS: &str = "id, user_id, total_xp, current_level, tier, updated_at";

/// Column list for `xp_events` queries.
const EVENT_COLUMNS: &str =
    "id, user_id, question_id, attempt_number, correct, xp_awarded, created_at";

/// Provides gamification persistence: XP totals, the append-only XP
/// ledger, and the daily-presence calendar.
pub struct UserStatsRepo;

impl UserStatsRepo {
    /// The user's stats row, creating the default row on first access.
    pub async fn get_or_create(pool: &PgPool, user_id: DbId) -> Result<UserStats, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_stats (user_id) \
             VALUES ($1) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING {STATS_COLUMNS}"
        );
        sqlx::query_as::<_, UserStats>(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Add XP to the user's total and store the recomputed level.
    pub async fn add_xp(
        pool: &PgPool,
        user_id: DbId,
        xp: i64,
        new_level: i32,
    ) -> Result<UserStats, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_stats (user_id, total_xp, current_level) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 total_xp = user_stats.total_xp + EXCLUDED.total_xp, \
                 current_level = $3, \
                 updated_at = NOW() \
             RETURNING {STATS_COLUMNS}"
        );
        sqlx::query_as::<_, UserStats>(&query)
            .bind(user_id)
            .bind(xp)
            .bind(new_level)
            .fetch_one(pool)
            .await
    }

    /// Append one XP ledger entry.
    pub async fn insert_xp_event(
        pool: &PgPool,
        user_id: DbId,
        question_id: Option<DbId>,
        attempt_number: i32,
        correct: bool,
        xp_awarded: i64,
    ) -> Result<XpEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO xp_events (user_id, question_id, attempt_number, correct, xp_awarded) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {EVENT_COLUMNS}"
        );
        sqlx::query_as::<_, XpEvent>(&query)
            .bind(user_id)
            .bind(question_id)
            .bind(attempt_number)
            .bind(correct)
            .bind(xp_awarded)
            .fetch_one(pool)
            .await
    }

    /// Mark the user present on a calendar day. Idempotent per day.
    pub async fn record_activity(
        pool: &PgPool,
        user_id: DbId,
        activity_date: NaiveDate,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO daily_activity (user_id, activity_date) \
             VALUES ($1, $2) \
             ON CONFLICT (user_id, activity_date) DO NOTHING",
        )
        .bind(user_id)
        .bind(activity_date)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// The user's full presence calendar, oldest first.
    pub async fn activity_dates(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<NaiveDate>, sqlx::Error> {
        let rows: Vec<(NaiveDate,)> = sqlx::query_as(
            "SELECT activity_date FROM daily_activity \
             WHERE user_id = $1 \
             ORDER BY activity_date",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(d,)| d).collect())
    }
}
