//! Behavior type lookup model.

use behavior_core::behavior_type::BehaviorType;
use behavior_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `behavior_types` lookup table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BehaviorTypeRow {
    pub id: DbId,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub type_name: String,
}

impl From<BehaviorTypeRow> for BehaviorType {
    fn from(row: BehaviorTypeRow) -> Self {
        BehaviorType::new(row.id, row.type_name)
    }
}
