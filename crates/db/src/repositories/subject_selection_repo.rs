//! Repository for the `user_subject_selections` table.

use meridian_core::types::DbId;
use sqlx::PgPool;

/// Provides the per-user subject scope used to filter the assessment
/// question set.
pub struct SubjectSelectionRepo;

impl SubjectSelectionRepo {
    /// Replace the user's selections with the given subject set.
    pub async fn replace_for_user(
        pool: &PgPool,
        user_id: DbId,
        subject_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM user_subject_selections WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if !subject_ids.is_empty() {
            sqlx::query(
                "INSERT INTO user_subject_selections (user_id, subject_id) \
                 SELECT $1, s FROM UNNEST($2::bigint[]) AS t(s) \
                 ON CONFLICT (user_id, subject_id) DO NOTHING",
            )
            .bind(user_id)
            .bind(subject_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }

    /// The user's selected subject IDs.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT subject_id FROM user_subject_selections \
             WHERE user_id = $1 \
             ORDER BY subject_id",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
