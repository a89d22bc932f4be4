//! Event handler entity model.

use behavior_core::behavior::EventHandler;
use behavior_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `event_handlers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventHandlerRow {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

impl From<EventHandlerRow> for EventHandler {
    fn from(row: EventHandlerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}
