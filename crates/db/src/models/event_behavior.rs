//! Event behavior entity model and DTOs.

use behavior_core::behavior::{BehaviorStatus, EventBehavior};
use behavior_core::error::CoreError;
use behavior_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `event_behaviors` table joined with its type name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventBehaviorRow {
    pub id: DbId,
    pub name: Option<String>,
    pub event_handler_id: DbId,
    pub behavior_type_id: DbId,
    pub behavior_type: String,
    pub sort_order: i32,
    pub status: String,
    pub message: String,
    pub subject: String,
    pub from_name: String,
    pub from_addr: String,
    pub recipients: String,
    pub headers: Option<String>,
    pub attachments: Option<String>,
    pub this_event_behavior_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub user_passtag_id: Option<DbId>,
}

impl EventBehaviorRow {
    /// Convert into the domain type, validating the stored status.
    pub fn into_behavior(self) -> Result<EventBehavior, CoreError> {
        Ok(EventBehavior {
            status: BehaviorStatus::from_str(&self.status)?,
            id: self.id,
            name: self.name,
            event_handler_id: self.event_handler_id,
            behavior_type_id: self.behavior_type_id,
            behavior_type: self.behavior_type,
            sort_order: self.sort_order,
            message: self.message,
            subject: self.subject,
            from_name: self.from_name,
            from_addr: self.from_addr,
            recipients: self.recipients,
            headers: self.headers,
            attachments: self.attachments,
            this_event_behavior_id: self.this_event_behavior_id,
            user_id: self.user_id,
            user_passtag_id: self.user_passtag_id,
        })
    }
}

/// DTO for inserting an event behavior.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEventBehavior {
    pub name: Option<String>,
    pub event_handler_id: DbId,
    pub behavior_type_id: DbId,
    pub sort_order: Option<i32>,
    pub status: Option<String>,
    pub message: Option<String>,
    pub subject: Option<String>,
    pub from_name: Option<String>,
    pub from_addr: Option<String>,
    pub recipients: Option<String>,
    pub headers: Option<String>,
    pub attachments: Option<String>,
    pub this_event_behavior_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub user_passtag_id: Option<DbId>,
}
