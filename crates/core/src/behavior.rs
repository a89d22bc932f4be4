//! Event handlers, event behaviors and the references used to look them up.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// BehaviorStatus
// ---------------------------------------------------------------------------

/// Stored status of an event behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorStatus {
    #[default]
    Default,
    Active,
    Inactive,
    Deleted,
}

impl BehaviorStatus {
    /// Return the wire-format string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Deleted => "deleted",
        }
    }

    /// Parse from a wire-format string.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "default" => Ok(Self::Default),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "deleted" => Ok(Self::Deleted),
            _ => Err(CoreError::Validation(format!(
                "Invalid behavior status: '{s}'. Must be one of: default, active, inactive, deleted"
            ))),
        }
    }
}

impl std::fmt::Display for BehaviorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Event handlers
// ---------------------------------------------------------------------------

/// An event handler registered by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHandler {
    pub id: DbId,
    pub name: String,
}

/// Reference to an event handler by id or by unique name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HandlerRef {
    Id(DbId),
    Name(String),
}

impl HandlerRef {
    /// Reject non-positive ids and blank names.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::Id(id) if *id <= 0 => Err(CoreError::Validation(format!(
                "Event handler id must be positive, got {id}"
            ))),
            Self::Name(name) if name.trim().is_empty() => Err(CoreError::Validation(
                "Event handler name must not be empty".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Whether `handler` is the one this reference points at.
    pub fn matches(&self, handler: &EventHandler) -> bool {
        match self {
            Self::Id(id) => handler.id == *id,
            Self::Name(name) => handler.name == *name,
        }
    }
}

impl From<DbId> for HandlerRef {
    fn from(id: DbId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for HandlerRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl std::fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Reference to an event behavior by id or by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BehaviorRef {
    Id(DbId),
    Name(String),
}

impl BehaviorRef {
    /// Reject non-positive ids and blank names.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::Id(id) if *id <= 0 => Err(CoreError::Validation(format!(
                "Event behavior id must be positive, got {id}"
            ))),
            Self::Name(name) if name.trim().is_empty() => Err(CoreError::Validation(
                "Event behavior name must not be empty".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl From<DbId> for BehaviorRef {
    fn from(id: DbId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for BehaviorRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl std::fmt::Display for BehaviorRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBehavior
// ---------------------------------------------------------------------------

/// A configured behavior attached to an event handler.
///
/// This mirrors the `event_behaviors` row joined with its type name, but is
/// defined here so the core crate stays independent of the DB crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBehavior {
    pub id: DbId,
    pub name: Option<String>,
    pub event_handler_id: DbId,
    pub behavior_type_id: DbId,
    /// Name of the behavior type (`behavior_types.type`).
    pub behavior_type: String,
    pub sort_order: i32,
    pub status: BehaviorStatus,
    pub message: String,
    pub subject: String,
    pub from_name: String,
    pub from_addr: String,
    pub recipients: String,
    /// JSON array or line-delimited list, as stored.
    pub headers: Option<String>,
    /// JSON array or line-delimited list, as stored.
    pub attachments: Option<String>,
    /// Behavior targeted by a status behavior.
    pub this_event_behavior_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub user_passtag_id: Option<DbId>,
}

impl EventBehavior {
    pub fn is_active(&self) -> bool {
        self.status == BehaviorStatus::Active
    }

    pub fn is_deleted(&self) -> bool {
        self.status == BehaviorStatus::Deleted
    }

    /// Mutable access to the single-valued fields filled by code replacement.
    ///
    /// `message` is not among them; it is rendered as a whole.
    pub fn template_fields_mut(&mut self) -> [&mut String; 4] {
        [
            &mut self.subject,
            &mut self.from_name,
            &mut self.from_addr,
            &mut self.recipients,
        ]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_all_variants_roundtrip() {
        let pairs = [
            ("default", BehaviorStatus::Default),
            ("active", BehaviorStatus::Active),
            ("inactive", BehaviorStatus::Inactive),
            ("deleted", BehaviorStatus::Deleted),
        ];
        for (s, variant) in &pairs {
            assert_eq!(&BehaviorStatus::from_str(s).unwrap(), variant);
            assert_eq!(variant.as_str(), *s);
        }
    }

    #[test]
    fn status_invalid_rejects() {
        assert!(BehaviorStatus::from_str("paused").is_err());
    }

    #[test]
    fn handler_ref_validation() {
        assert!(HandlerRef::Id(3).validate().is_ok());
        assert!(HandlerRef::from("user.registered").validate().is_ok());
        assert!(HandlerRef::Id(0).validate().is_err());
        assert!(HandlerRef::Name("  ".to_string()).validate().is_err());
    }

    #[test]
    fn handler_ref_matches_by_id_or_name() {
        let handler = EventHandler {
            id: 4,
            name: "order.completed".to_string(),
        };
        assert!(HandlerRef::Id(4).matches(&handler));
        assert!(HandlerRef::from("order.completed").matches(&handler));
        assert!(!HandlerRef::Id(5).matches(&handler));
    }

    #[test]
    fn behavior_ref_validation() {
        assert!(BehaviorRef::Id(-2).validate().is_err());
        assert!(BehaviorRef::Name(String::new()).validate().is_err());
        assert!(BehaviorRef::from("welcome-email").validate().is_ok());
        assert_eq!(BehaviorRef::Id(12).to_string(), "12");
    }
}
