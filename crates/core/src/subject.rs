//! Status overrides and their precedence.
//!
//! An override forces the status of one behavior for a subject: everyone,
//! every user, a single user, or every member of a passtag. When several
//! overrides match a trigger the most specific one wins:
//!
//! 1. [`OverrideSubject::User`]
//! 2. [`OverrideSubject::Passtag`] (higher passtag id first)
//! 3. [`OverrideSubject::AllUsers`]
//! 4. [`OverrideSubject::Everyone`]
//!
//! Remaining ties go to the most recently written row.

use serde::{Deserialize, Serialize};

use crate::context::MatchScope;
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Column encoding
// ---------------------------------------------------------------------------

/// `user_id` written for [`OverrideSubject::AllUsers`].
pub const ALL_USERS_USER_ID: DbId = -1;

/// `user_id` written for [`OverrideSubject::Everyone`]. Any value at or below
/// this one decodes as `Everyone`.
pub const EVERYONE_USER_ID: DbId = -2;

/// Value written to a column that does not scope the override.
pub const UNSET_ID: DbId = 0;

// ---------------------------------------------------------------------------
// OverrideStatus
// ---------------------------------------------------------------------------

/// Status forced by an override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideStatus {
    Active,
    Inactive,
}

impl OverrideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(CoreError::Validation(format!(
                "Invalid override status: '{s}'. Must be one of: active, inactive"
            ))),
        }
    }
}

impl std::fmt::Display for OverrideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OverrideSubject
// ---------------------------------------------------------------------------

/// Who an override applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum OverrideSubject {
    /// Every trigger, including ones without a user.
    Everyone,
    /// Every trigger that carries a user, with or without an account.
    AllUsers,
    User(DbId),
    Passtag(DbId),
}

impl OverrideSubject {
    /// Decode the `(user_id, user_passtag_id)` columns.
    ///
    /// Returns `None` for rows that name neither a subject nor a global
    /// marker (`user_id = 0` without a passtag); such rows never match.
    pub fn from_columns(user_id: Option<DbId>, user_passtag_id: Option<DbId>) -> Option<Self> {
        let passtag = user_passtag_id.filter(|id| *id > 0);
        match (user_id, passtag) {
            (Some(id), _) if id > 0 => Some(Self::User(id)),
            (_, Some(passtag)) => Some(Self::Passtag(passtag)),
            (None, None) => Some(Self::AllUsers),
            (Some(ALL_USERS_USER_ID), None) => Some(Self::AllUsers),
            (Some(id), None) if id <= EVERYONE_USER_ID => Some(Self::Everyone),
            _ => None,
        }
    }

    /// Encode as `(user_id, user_passtag_id)` columns.
    pub fn to_columns(&self) -> (DbId, DbId) {
        match self {
            Self::Everyone => (EVERYONE_USER_ID, UNSET_ID),
            Self::AllUsers => (ALL_USERS_USER_ID, UNSET_ID),
            Self::User(id) => (*id, UNSET_ID),
            Self::Passtag(id) => (UNSET_ID, *id),
        }
    }

    /// Whether an override for this subject applies to the trigger.
    pub fn matches(&self, scope: &MatchScope) -> bool {
        match self {
            Self::Everyone => true,
            Self::AllUsers => scope.has_user,
            Self::User(id) => scope.user_id == Some(*id),
            Self::Passtag(id) => scope.passtag_ids.contains(id),
        }
    }

    /// Sort key; greater is more specific.
    fn specificity(&self) -> (u8, DbId) {
        match self {
            Self::User(id) => (3, *id),
            Self::Passtag(id) => (2, *id),
            Self::AllUsers => (1, 0),
            Self::Everyone => (0, 0),
        }
    }
}

// ---------------------------------------------------------------------------
// StatusOverride
// ---------------------------------------------------------------------------

/// A forced status for one behavior and one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOverride {
    pub event_behavior_id: DbId,
    pub subject: OverrideSubject,
    pub status: OverrideStatus,
    pub time: Timestamp,
}

/// Pick the status of the most specific override matching `scope`.
///
/// Rows belonging to other behaviors are ignored. Returns `None` when no row
/// matches.
pub fn effective_status(
    overrides: &[StatusOverride],
    behavior_id: DbId,
    scope: &MatchScope,
) -> Option<OverrideStatus> {
    overrides
        .iter()
        .filter(|o| o.event_behavior_id == behavior_id && o.subject.matches(scope))
        .max_by(|a, b| {
            a.subject
                .specificity()
                .cmp(&b.subject.specificity())
                .then(a.time.cmp(&b.time))
        })
        .map(|o| o.status)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn row(behavior: DbId, subject: OverrideSubject, status: OverrideStatus) -> StatusOverride {
        StatusOverride {
            event_behavior_id: behavior,
            subject,
            status,
            time: at(0),
        }
    }

    fn member(id: DbId, passtags: &[DbId]) -> MatchScope {
        MatchScope {
            has_user: true,
            user_id: Some(id),
            passtag_ids: passtags.to_vec(),
        }
    }

    // -- column encoding ----------------------------------------------------

    #[test]
    fn decode_columns() {
        use OverrideSubject::*;
        assert_eq!(OverrideSubject::from_columns(Some(10), Some(0)), Some(User(10)));
        assert_eq!(OverrideSubject::from_columns(Some(10), Some(4)), Some(User(10)));
        assert_eq!(OverrideSubject::from_columns(Some(0), Some(4)), Some(Passtag(4)));
        assert_eq!(OverrideSubject::from_columns(None, Some(4)), Some(Passtag(4)));
        assert_eq!(OverrideSubject::from_columns(Some(-1), Some(0)), Some(AllUsers));
        assert_eq!(OverrideSubject::from_columns(None, None), Some(AllUsers));
        assert_eq!(OverrideSubject::from_columns(Some(-2), None), Some(Everyone));
        assert_eq!(OverrideSubject::from_columns(Some(-9), Some(0)), Some(Everyone));
        assert_eq!(OverrideSubject::from_columns(Some(0), Some(0)), None);
    }

    #[test]
    fn encode_columns_decodes_back() {
        for subject in [
            OverrideSubject::Everyone,
            OverrideSubject::AllUsers,
            OverrideSubject::User(7),
            OverrideSubject::Passtag(3),
        ] {
            let (user_id, passtag_id) = subject.to_columns();
            assert_eq!(
                OverrideSubject::from_columns(Some(user_id), Some(passtag_id)),
                Some(subject)
            );
        }
    }

    #[test]
    fn override_status_parsing() {
        assert_eq!(OverrideStatus::from_str("active").unwrap(), OverrideStatus::Active);
        assert_eq!(OverrideStatus::Inactive.as_str(), "inactive");
        assert!(OverrideStatus::from_str("default").is_err());
    }

    // -- matching -----------------------------------------------------------

    #[test]
    fn without_user_only_everyone_matches() {
        let scope = MatchScope::default();
        assert!(OverrideSubject::Everyone.matches(&scope));
        assert!(!OverrideSubject::AllUsers.matches(&scope));
        assert!(!OverrideSubject::User(1).matches(&scope));
        assert!(!OverrideSubject::Passtag(1).matches(&scope));
    }

    #[test]
    fn visitor_matches_all_users_but_no_user_row() {
        let scope = MatchScope {
            has_user: true,
            user_id: None,
            passtag_ids: vec![],
        };
        assert!(OverrideSubject::AllUsers.matches(&scope));
        assert!(!OverrideSubject::User(0).matches(&scope));
    }

    // -- precedence ---------------------------------------------------------

    #[test]
    fn user_row_beats_global_row() {
        let rows = vec![
            row(5, OverrideSubject::User(10), OverrideStatus::Inactive),
            row(5, OverrideSubject::AllUsers, OverrideStatus::Active),
        ];
        let scope = member(10, &[]);
        assert_eq!(effective_status(&rows, 5, &scope), Some(OverrideStatus::Inactive));

        let reversed: Vec<_> = rows.into_iter().rev().collect();
        assert_eq!(
            effective_status(&reversed, 5, &scope),
            Some(OverrideStatus::Inactive)
        );
    }

    #[test]
    fn passtag_row_beats_global_but_not_user() {
        let rows = vec![
            row(5, OverrideSubject::Everyone, OverrideStatus::Active),
            row(5, OverrideSubject::Passtag(3), OverrideStatus::Inactive),
        ];
        assert_eq!(
            effective_status(&rows, 5, &member(10, &[3])),
            Some(OverrideStatus::Inactive)
        );

        let mut with_user = rows.clone();
        with_user.push(row(5, OverrideSubject::User(10), OverrideStatus::Active));
        assert_eq!(
            effective_status(&with_user, 5, &member(10, &[3])),
            Some(OverrideStatus::Active)
        );
    }

    #[test]
    fn higher_passtag_id_wins_between_groups() {
        let rows = vec![
            row(5, OverrideSubject::Passtag(9), OverrideStatus::Active),
            row(5, OverrideSubject::Passtag(2), OverrideStatus::Inactive),
        ];
        assert_eq!(
            effective_status(&rows, 5, &member(1, &[2, 9])),
            Some(OverrideStatus::Active)
        );
    }

    #[test]
    fn all_users_beats_everyone() {
        let rows = vec![
            row(5, OverrideSubject::AllUsers, OverrideStatus::Inactive),
            row(5, OverrideSubject::Everyone, OverrideStatus::Active),
        ];
        assert_eq!(
            effective_status(&rows, 5, &member(1, &[])),
            Some(OverrideStatus::Inactive)
        );
        assert_eq!(
            effective_status(&rows, 5, &MatchScope::default()),
            Some(OverrideStatus::Active)
        );
    }

    #[test]
    fn newer_row_breaks_remaining_ties() {
        let mut old = row(5, OverrideSubject::Everyone, OverrideStatus::Active);
        old.time = at(0);
        let mut new = row(5, OverrideSubject::Everyone, OverrideStatus::Inactive);
        new.time = at(60);
        assert_eq!(
            effective_status(&[new, old], 5, &MatchScope::default()),
            Some(OverrideStatus::Inactive)
        );
    }

    #[test]
    fn other_behaviors_and_non_matching_rows_are_ignored() {
        let rows = vec![
            row(6, OverrideSubject::Everyone, OverrideStatus::Active),
            row(5, OverrideSubject::User(11), OverrideStatus::Active),
            row(5, OverrideSubject::Passtag(4), OverrideStatus::Active),
        ];
        assert_eq!(effective_status(&rows, 5, &member(10, &[3])), None);
    }
}
