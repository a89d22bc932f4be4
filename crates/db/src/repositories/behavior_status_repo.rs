//! Repository for the `event_behavior_statuses` table.

use behavior_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::behavior_status::BehaviorStatusRow;

/// Column list for `event_behavior_statuses` queries.
const COLUMNS: &str = "event_behavior_id, user_id, user_passtag_id, status, time";

/// Provides reads and upserts of status overrides.
pub struct BehaviorStatusRepo;

impl BehaviorStatusRepo {
    /// List every override row of one behavior.
    pub async fn list_for_behavior(
        pool: &PgPool,
        event_behavior_id: DbId,
    ) -> Result<Vec<BehaviorStatusRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM event_behavior_statuses \
             WHERE event_behavior_id = $1 \
             ORDER BY user_id DESC, user_passtag_id DESC"
        );
        sqlx::query_as::<_, BehaviorStatusRow>(&query)
            .bind(event_behavior_id)
            .fetch_all(pool)
            .await
    }

    /// Insert or replace the override for `(event_behavior_id, user_id,
    /// user_passtag_id)`.
    ///
    /// Uses `INSERT ... ON CONFLICT ... DO UPDATE` so the last write wins in
    /// a single round-trip.
    pub async fn upsert(
        pool: &PgPool,
        event_behavior_id: DbId,
        user_id: DbId,
        user_passtag_id: DbId,
        status: &str,
        time: Timestamp,
    ) -> Result<BehaviorStatusRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO event_behavior_statuses \
                (event_behavior_id, user_id, user_passtag_id, status, time) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (event_behavior_id, user_id, user_passtag_id) DO UPDATE SET \
                status = EXCLUDED.status, \
                time = EXCLUDED.time \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BehaviorStatusRow>(&query)
            .bind(event_behavior_id)
            .bind(user_id)
            .bind(user_passtag_id)
            .bind(status)
            .bind(time)
            .fetch_one(pool)
            .await
    }
}
