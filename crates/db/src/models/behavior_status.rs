//! Status override rows (`event_behavior_statuses`).

use behavior_core::error::CoreError;
use behavior_core::subject::{OverrideStatus, OverrideSubject, StatusOverride};
use behavior_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `event_behavior_statuses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BehaviorStatusRow {
    pub event_behavior_id: DbId,
    pub user_id: DbId,
    pub user_passtag_id: DbId,
    pub status: String,
    pub time: Timestamp,
}

impl BehaviorStatusRow {
    /// Decode into a domain override.
    ///
    /// Returns `Ok(None)` for rows whose columns name no subject; such rows
    /// can never match a trigger.
    pub fn into_override(self) -> Result<Option<StatusOverride>, CoreError> {
        let status = OverrideStatus::from_str(&self.status)?;
        Ok(
            OverrideSubject::from_columns(Some(self.user_id), Some(self.user_passtag_id)).map(
                |subject| StatusOverride {
                    event_behavior_id: self.event_behavior_id,
                    subject,
                    status,
                    time: self.time,
                },
            ),
        )
    }
}
