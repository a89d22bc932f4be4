use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Missing event handler ID/name: `{0}`")]
    HandlerMissing(String),

    #[error("Missing event behavior ID/name: `{0}`")]
    BehaviorMissing(String),

    #[error("Invalid behavior type: `{0}`")]
    InvalidBehaviorType(DbId),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
