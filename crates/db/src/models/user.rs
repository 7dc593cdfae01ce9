//! User account and refresh-session models.

use meridian_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
///
/// `password_hash` is deliberately excluded from serialization.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub display_name: String,
    pub career_goal: Option<String>,
    pub onboarding_complete: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `auth_sessions` table (one per issued refresh token).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuthSession {
    pub id: DbId,
    pub user_id: DbId,
    #[serde(skip_serializing)]
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for creating a user account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub display_name: String,
    pub career_goal: Option<String>,
}
