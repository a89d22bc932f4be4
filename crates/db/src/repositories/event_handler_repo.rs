//! Repository for the `event_handlers` table.

use behavior_core::types::DbId;
use sqlx::PgPool;

use crate::models::event_handler::EventHandlerRow;

/// Column list for `event_handlers` queries.
const COLUMNS: &str = "id, name, created_at";

/// Provides lookups for event handlers registered by the host application.
pub struct EventHandlerRepo;

impl EventHandlerRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<EventHandlerRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM event_handlers WHERE id = $1");
        sqlx::query_as::<_, EventHandlerRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(
        pool: &PgPool,
        name: &str,
    ) -> Result<Option<EventHandlerRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM event_handlers WHERE name = $1");
        sqlx::query_as::<_, EventHandlerRow>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Register a handler, returning the existing row when the name is taken.
    pub async fn ensure(pool: &PgPool, name: &str) -> Result<EventHandlerRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO event_handlers (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EventHandlerRow>(&query)
            .bind(name)
            .fetch_one(pool)
            .await
    }
}
