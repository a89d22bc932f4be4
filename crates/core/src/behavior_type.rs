//! Behavior type registry.
//!
//! Behavior types live in the `behavior_types` lookup table. The names below
//! are the ones the engine attaches meaning to; any other name is carried
//! through the registry but never dispatched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// The seeded "default" type. Behaviors pointing at it are normalized to
/// [`TYPE_NONE`] on load.
pub const TYPE_DEFAULT: &str = "default";

/// Name given to behaviors that perform no action.
pub const TYPE_NONE: &str = "none";

/// Sends an email built from the behavior's template fields.
pub const TYPE_EMAIL: &str = "email";

/// Forces another behavior to `active` for a user or passtag.
pub const TYPE_ACTIVATE_STATUS: &str = "activate_status";

/// Forces another behavior to `inactive` for a user or passtag.
pub const TYPE_DEACTIVATE_STATUS: &str = "deactivate_status";

/// Type id assigned to behaviors normalized to [`TYPE_NONE`].
pub const NONE_TYPE_ID: DbId = 0;

/// Type ids at or below this value mean "no behavior" or "default".
pub const MAX_RESERVED_TYPE_ID: DbId = 1;

/// Whether a behavior with this type id may ever be selected for execution.
pub fn is_actionable_type_id(type_id: DbId) -> bool {
    type_id > MAX_RESERVED_TYPE_ID
}

// ---------------------------------------------------------------------------
// BehaviorType
// ---------------------------------------------------------------------------

/// A row of the `behavior_types` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorType {
    pub id: DbId,
    pub name: String,
}

impl BehaviorType {
    pub fn new(id: DbId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn kind(&self) -> BehaviorKind {
        BehaviorKind::from_name(&self.name)
    }
}

// ---------------------------------------------------------------------------
// BehaviorKind
// ---------------------------------------------------------------------------

/// What the engine does with a behavior of a given type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BehaviorKind {
    /// `none` or `default`: nothing to execute.
    None,
    Email,
    ActivateStatus,
    DeactivateStatus,
    /// A type the engine has no processor for.
    Other(String),
}

impl BehaviorKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            TYPE_NONE | TYPE_DEFAULT => Self::None,
            TYPE_EMAIL => Self::Email,
            TYPE_ACTIVATE_STATUS => Self::ActivateStatus,
            TYPE_DEACTIVATE_STATUS => Self::DeactivateStatus,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::None => TYPE_NONE,
            Self::Email => TYPE_EMAIL,
            Self::ActivateStatus => TYPE_ACTIVATE_STATUS,
            Self::DeactivateStatus => TYPE_DEACTIVATE_STATUS,
            Self::Other(name) => name,
        }
    }

    /// Whether behaviors of this kind are handled by the status processor.
    pub fn is_status(&self) -> bool {
        matches!(self, Self::ActivateStatus | Self::DeactivateStatus)
    }
}

impl std::fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Lookup of behavior types by id and by name.
#[derive(Debug, Clone, Default)]
pub struct BehaviorTypeRegistry {
    by_id: HashMap<DbId, BehaviorType>,
    by_name: HashMap<String, DbId>,
}

impl BehaviorTypeRegistry {
    /// Build a registry. Types with a blank name are ignored.
    pub fn new(types: impl IntoIterator<Item = BehaviorType>) -> Self {
        let mut registry = Self::default();
        for ty in types {
            if ty.name.trim().is_empty() {
                continue;
            }
            registry.by_name.insert(ty.name.clone(), ty.id);
            registry.by_id.insert(ty.id, ty);
        }
        registry
    }

    pub fn get(&self, id: DbId) -> Option<&BehaviorType> {
        self.by_id.get(&id)
    }

    /// Numeric id of a type name, if registered.
    pub fn id(&self, name: &str) -> Option<DbId> {
        self.by_name.get(name).copied()
    }

    /// Id of the seeded [`TYPE_DEFAULT`] type.
    pub fn default_type_id(&self) -> Option<DbId> {
        self.id(TYPE_DEFAULT)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
