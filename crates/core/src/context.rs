//! Trigger context (the meta-vars of a firing event) and the user it carries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A concrete user, as returned by the user resolver.
///
/// `id` is `None` for visitors that have no account. `fields` carries any
/// extra profile data the host wants exposed to templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<DbId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub passtag_ids: Vec<DbId>,
    #[serde(default, flatten)]
    pub fields: Map<String, Value>,
}

impl User {
    /// A visitor with no identity and no passtags.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_id(id: DbId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn with_passtags(mut self, passtag_ids: impl IntoIterator<Item = DbId>) -> Self {
        self.passtag_ids = passtag_ids.into_iter().collect();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Whether the user has a real (positive) account id.
    pub fn has_id(&self) -> bool {
        self.id.is_some_and(|id| id > 0)
    }

    /// Positive passtag ids, in membership order.
    pub fn passtag_ids(&self) -> Vec<DbId> {
        self.passtag_ids.iter().copied().filter(|id| *id > 0).collect()
    }
}

/// An ambiguous reference to the user that triggered an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(DbId),
    Login(String),
    Resolved(User),
}

// ---------------------------------------------------------------------------
// TriggerContext
// ---------------------------------------------------------------------------

/// Meta-vars specific to a firing event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerContext {
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub vars: Map<String, Value>,
}

impl TriggerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: UserRef) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// A context must carry a user or at least one variable.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.user.is_none() && self.vars.is_empty() {
            return Err(CoreError::Validation(
                "Trigger context must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The user, if it has already been resolved.
    pub fn resolved_user(&self) -> Option<&User> {
        match &self.user {
            Some(UserRef::Resolved(user)) => Some(user),
            _ => None,
        }
    }

    /// Copy of this context with the user replaced by its resolved form.
    pub fn with_resolved_user(&self, user: Option<User>) -> Self {
        Self {
            user: user.map(UserRef::Resolved),
            vars: self.vars.clone(),
        }
    }

    /// Variables visible to templates: `vars` overlaid with the context's own
    /// variables, plus the resolved user under `user`.
    pub fn template_scope(&self, vars: &Map<String, Value>) -> Map<String, Value> {
        let mut scope = vars.clone();
        for (key, value) in &self.vars {
            scope.insert(key.clone(), value.clone());
        }
        if let Some(user) = self.resolved_user() {
            if let Ok(value) = serde_json::to_value(user) {
                scope.insert("user".to_string(), value);
            }
        }
        scope
    }
}

// ---------------------------------------------------------------------------
// MatchScope
// ---------------------------------------------------------------------------

/// The identity facts an override row is matched against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchScope {
    /// The event carries a user, even one without an account.
    pub has_user: bool,
    pub user_id: Option<DbId>,
    pub passtag_ids: Vec<DbId>,
}

impl MatchScope {
    pub fn for_user(user: Option<&User>) -> Self {
        match user {
            None => Self::default(),
            Some(user) => Self {
                has_user: true,
                user_id: user.id.filter(|_| user.has_id()),
                passtag_ids: user.passtag_ids(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
