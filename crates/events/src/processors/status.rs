//! Status behaviors (`activate_status`, `deactivate_status`).
//!
//! A status behavior writes an override for another behavior, scoped to the
//! subject it names or, when it names none, to the triggering user or that
//! user's first passtag.

use behavior_core::behavior::{BehaviorRef, EventBehavior};
use behavior_core::behavior_type::BehaviorKind;
use behavior_core::context::{TriggerContext, User};
use behavior_core::error::CoreError;
use behavior_core::subject::{OverrideStatus, OverrideSubject, StatusOverride};
use behavior_core::types::DbId;
use chrono::Utc;
use serde_json::{Map, Value};

use crate::error::BehaviorResult;
use crate::processors::{Outcome, SkipReason};
use crate::store::BehaviorStore;

#[derive(Clone)]
pub struct StatusProcessor {
    store: BehaviorStore,
}

impl StatusProcessor {
    pub fn new(store: BehaviorStore) -> Self {
        Self { store }
    }

    /// Write the override a status behavior describes.
    ///
    /// Only the behavior's stored status is checked here. `vars` is accepted
    /// for parity with the other processors; status behaviors have no
    /// template fields.
    pub async fn process(
        &self,
        behavior: &BehaviorRef,
        context: &TriggerContext,
        _vars: &Map<String, Value>,
    ) -> BehaviorResult<Outcome> {
        context.validate()?;
        let behavior = self.store.require_behavior(behavior).await?;
        let behavior_type = self
            .store
            .behavior_type(behavior.behavior_type_id)
            .await?
            .ok_or(CoreError::InvalidBehaviorType(behavior.behavior_type_id))?;

        if !behavior.is_active() {
            return Ok(skip(behavior.id, SkipReason::NotActive));
        }
        let Some(target) = behavior.this_event_behavior_id.filter(|id| *id > 0) else {
            return Ok(skip(behavior.id, SkipReason::NoTarget));
        };

        let collab = self.store.collaborators();
        let user = collab.resolve_user(context).await?;
        let Some(subject) = override_subject(&behavior, user.as_ref()) else {
            return Ok(skip(behavior.id, SkipReason::NoSubject));
        };
        let forced = match behavior_type.kind() {
            BehaviorKind::ActivateStatus => OverrideStatus::Active,
            BehaviorKind::DeactivateStatus => OverrideStatus::Inactive,
            other => {
                return Ok(skip(behavior.id, SkipReason::UnsupportedType(other.to_string())));
            }
        };

        let row = StatusOverride {
            event_behavior_id: target,
            subject,
            status: forced,
            time: Utc::now(),
        };
        collab.persistence.upsert_override(&row).await?;

        tracing::info!(
            behavior_id = behavior.id,
            target_behavior_id = target,
            subject = ?subject,
            status = %forced,
            "Status behavior executed"
        );
        Ok(Outcome::Executed)
    }
}

/// Who the written override applies to.
///
/// A subject stored on the behavior wins and never carries a passtag. Stored
/// ids below `-2` are written as the `-2` everyone marker, which they already
/// decode to. Otherwise the triggering user's id is used, then their first
/// passtag.
fn override_subject(behavior: &EventBehavior, user: Option<&User>) -> Option<OverrideSubject> {
    if let Some(user_id) = behavior.user_id.filter(|id| *id != 0) {
        return OverrideSubject::from_columns(Some(user_id), None);
    }
    let user = user?;
    if let Some(id) = user.id.filter(|_| user.has_id()) {
        return Some(OverrideSubject::User(id));
    }
    user.passtag_ids().first().copied().map(OverrideSubject::Passtag)
}

fn skip(behavior_id: DbId, reason: SkipReason) -> Outcome {
    tracing::debug!(behavior_id, reason = %reason, "Status behavior skipped");
    Outcome::Skipped(reason)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
