//! Per-user module status model.

use meridian_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_module_status` table.
///
/// Upserted on every recomputation, never deleted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserModuleStatus {
    pub id: DbId,
    pub user_id: DbId,
    pub module_id: DbId,
    pub correctness_percentage: i32,
    pub status: String,
    pub last_updated: Timestamp,
}
