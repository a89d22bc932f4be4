//! Repository for the `event_behaviors` table.

use behavior_core::types::DbId;
use sqlx::PgPool;

use crate::models::event_behavior::{CreateEventBehavior, EventBehaviorRow};

/// Column list for `event_behaviors` queries joined with `behavior_types`
/// (aliased `eb` and `bt`).
const JOINED_COLUMNS: &str = "eb.id, eb.name, eb.event_handler_id, eb.behavior_type_id, \
    bt.type AS behavior_type, eb.sort_order, eb.status, eb.message, eb.subject, eb.from_name, \
    eb.from_addr, eb.recipients, eb.headers, eb.attachments, eb.this_event_behavior_id, \
    eb.user_id, eb.user_passtag_id";

/// Provides read access to configured behaviors plus inserts for tooling.
pub struct EventBehaviorRepo;

impl EventBehaviorRepo {
    /// Load every behavior that has a named type and a handler.
    ///
    /// Rows are ordered by `sort_order`, then `id`, so that behaviors sharing
    /// an order keep a stable position.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<EventBehaviorRow>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} \
             FROM event_behaviors eb \
             JOIN behavior_types bt ON bt.id = eb.behavior_type_id \
             WHERE eb.behavior_type_id >= 0 \
               AND bt.type <> '' \
               AND eb.event_handler_id > 0 \
             ORDER BY eb.sort_order ASC, eb.id ASC"
        );
        sqlx::query_as::<_, EventBehaviorRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Insert a behavior, returning the generated ID.
    pub async fn create(pool: &PgPool, input: &CreateEventBehavior) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO event_behaviors \
                (name, event_handler_id, behavior_type_id, sort_order, status, message, subject, \
                 from_name, from_addr, recipients, headers, attachments, this_event_behavior_id, \
                 user_id, user_passtag_id) \
             VALUES ($1, $2, $3, COALESCE($4, 0), COALESCE($5, 'default'), COALESCE($6, ''), \
                     COALESCE($7, ''), COALESCE($8, ''), COALESCE($9, ''), COALESCE($10, ''), \
                     $11, $12, $13, $14, $15) \
             RETURNING id",
        )
        .bind(&input.name)
        .bind(input.event_handler_id)
        .bind(input.behavior_type_id)
        .bind(input.sort_order)
        .bind(&input.status)
        .bind(&input.message)
        .bind(&input.subject)
        .bind(&input.from_name)
        .bind(&input.from_addr)
        .bind(&input.recipients)
        .bind(&input.headers)
        .bind(&input.attachments)
        .bind(input.this_event_behavior_id)
        .bind(input.user_id)
        .bind(input.user_passtag_id)
        .fetch_one(pool)
        .await
    }
}
