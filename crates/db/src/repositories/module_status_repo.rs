//! Repository for the `user_module_status` ledger.

use meridian_core::types::DbId;
use sqlx::PgPool;

use crate::models::module_status::UserModuleStatus;

/// Column list for `user_module_status` queries.
const COLUMNS: &str = "id, user_id, module_id, correctness_percentage, status, last_updated";

/// Provides merge-on-conflict persistence for per-module scores.
/// Rows are overwritten on recomputation, never deleted.
pub struct ModuleStatusRepo;

impl ModuleStatusRepo {
    /// Upsert one (user, module) status row.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        module_id: DbId,
        correctness_percentage: i32,
        status: &str,
    ) -> Result<UserModuleStatus, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_module_status (user_id, module_id, correctness_percentage, status) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, module_id) DO UPDATE SET \
                 correctness_percentage = EXCLUDED.correctness_percentage, \
                 status = EXCLUDED.status, \
                 last_updated = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserModuleStatus>(&query)
            .bind(user_id)
            .bind(module_id)
            .bind(correctness_percentage)
            .bind(status)
            .fetch_one(pool)
            .await
    }

    /// All status rows for a user, by module.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<UserModuleStatus>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_module_status \
             WHERE user_id = $1 \
             ORDER BY module_id"
        );
        sqlx::query_as::<_, UserModuleStatus>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

}
