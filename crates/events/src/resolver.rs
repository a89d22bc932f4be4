//! Effective status of a behavior for one trigger.

use behavior_core::behavior::{BehaviorStatus, EventBehavior, HandlerRef};
use behavior_core::context::{MatchScope, TriggerContext};
use behavior_core::error::CoreError;
use behavior_core::subject::{self, OverrideStatus};
use behavior_core::types::DbId;

use crate::collaborators::Collaborators;
use crate::error::BehaviorResult;

/// Reads status overrides and applies their precedence.
///
/// Every call reads the override rows afresh; nothing is cached, so equal
/// persistence state and context always give the same answer.
#[derive(Clone)]
pub struct StatusResolver {
    collab: Collaborators,
}

impl StatusResolver {
    pub fn new(collab: Collaborators) -> Self {
        Self { collab }
    }

    /// Forced status of `behavior_id` for the trigger, or `None` when no
    /// override applies.
    pub async fn resolve(
        &self,
        handler: &HandlerRef,
        context: &TriggerContext,
        behavior_id: DbId,
    ) -> BehaviorResult<Option<OverrideStatus>> {
        if behavior_id <= 0 {
            return Err(CoreError::Validation(format!(
                "Event behavior id must be positive, got {behavior_id}"
            ))
            .into());
        }
        context.validate()?;
        self.collab.require_handler(handler).await?;

        let user = self.collab.resolve_user(context).await?;
        self.resolve_for_scope(behavior_id, &MatchScope::for_user(user.as_ref()))
            .await
    }

    /// Forced status of `behavior_id` for an already derived scope.
    pub async fn resolve_for_scope(
        &self,
        behavior_id: DbId,
        scope: &MatchScope,
    ) -> BehaviorResult<Option<OverrideStatus>> {
        let overrides = self.collab.persistence.overrides_for(behavior_id).await?;
        Ok(subject::effective_status(&overrides, behavior_id, scope))
    }

    /// The behavior's status once overrides are applied.
    ///
    /// Deleted behaviors stay deleted and are never looked up.
    pub async fn effective_status(
        &self,
        behavior: &EventBehavior,
        scope: &MatchScope,
    ) -> BehaviorResult<BehaviorStatus> {
        if behavior.is_deleted() {
            return Ok(BehaviorStatus::Deleted);
        }
        Ok(match self.resolve_for_scope(behavior.id, scope).await? {
            Some(OverrideStatus::Active) => BehaviorStatus::Active,
            Some(OverrideStatus::Inactive) => BehaviorStatus::Inactive,
            None => behavior.status,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
