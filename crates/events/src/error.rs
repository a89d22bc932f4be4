use behavior_core::error::CoreError;

use crate::delivery::email::EmailError;

/// Error type for behavior resolution and execution.
///
/// Wraps [`CoreError`] for domain errors (missing handler, missing behavior,
/// invalid type, validation) and adds the infrastructure failures that are
/// propagated unchanged to the caller.
#[derive(Debug, thiserror::Error)]
pub enum BehaviorError {
    /// A domain-level error from `behavior_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The mail transport rejected a message.
    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Convenience alias for fallible engine operations.
pub type BehaviorResult<T> = Result<T, BehaviorError>;
