//! Executors for individual behaviors.
//!
//! A processor looks the behavior up again through the store, works on its
//! own copy, and either performs the side effect or reports why it did not.
//! "Nothing to do" is never an error.

pub mod email;
pub mod status;

use serde::Serialize;

pub use email::EmailProcessor;
pub use status::StatusProcessor;

/// Result of processing one behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Executed,
    Skipped(SkipReason),
}

impl Outcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed)
    }
}

/// Why a behavior was not executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Status after overrides is not `active`.
    NotActive,
    /// A required email field is empty after substitution.
    EmptyField(&'static str),
    /// No recipient parsed as a mailbox.
    NoRecipients,
    /// The mailer drops every message.
    MailDisabled,
    /// A status behavior without a positive target behavior.
    NoTarget,
    /// Neither the behavior nor the trigger names a user or passtag.
    NoSubject,
    /// The processor has nothing to do for this behavior type.
    UnsupportedType(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotActive => f.write_str("not active"),
            Self::EmptyField(field) => write!(f, "empty {field}"),
            Self::NoRecipients => f.write_str("no valid recipients"),
            Self::MailDisabled => f.write_str("mail delivery disabled"),
            Self::NoTarget => f.write_str("no target behavior"),
            Self::NoSubject => f.write_str("no user or passtag"),
            Self::UnsupportedType(name) => write!(f, "unsupported type `{name}`"),
        }
    }
}
