//! Active behaviors of an event handler.

use behavior_core::behavior::{BehaviorStatus, EventBehavior, HandlerRef};
use behavior_core::behavior_type::is_actionable_type_id;
use behavior_core::context::{MatchScope, TriggerContext};
use behavior_core::types::DbId;
use indexmap::IndexMap;

use crate::error::BehaviorResult;
use crate::resolver::StatusResolver;
use crate::store::BehaviorStore;

/// Picks the behaviors of a handler that should run for a trigger.
#[derive(Clone)]
pub struct ActivationSelector {
    store: BehaviorStore,
    resolver: StatusResolver,
}

impl ActivationSelector {
    pub fn new(store: BehaviorStore, resolver: StatusResolver) -> Self {
        Self { store, resolver }
    }

    /// Active behaviors of `handler`, keyed by id, in `sort_order`.
    ///
    /// Deleted behaviors and behaviors of a reserved type are dropped before
    /// any override is read. The remaining ones are kept when their status,
    /// after overrides, is `active`.
    pub async fn active_for(
        &self,
        handler: &HandlerRef,
        context: &TriggerContext,
    ) -> BehaviorResult<IndexMap<DbId, EventBehavior>> {
        context.validate()?;
        let candidates = self.store.for_handler(handler).await?;
        let user = self.store.collaborators().resolve_user(context).await?;
        let scope = MatchScope::for_user(user.as_ref());

        let mut active = IndexMap::new();
        for behavior in candidates {
            if behavior.is_deleted() || !is_actionable_type_id(behavior.behavior_type_id) {
                continue;
            }
            let status = self.resolver.effective_status(&behavior, &scope).await?;
            if status == BehaviorStatus::Active {
                active.insert(behavior.id, behavior);
            }
        }

        tracing::debug!(handler = %handler, active = active.len(), "Selected active behaviors");
        Ok(active)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use behavior_core::context::UserRef;
    use behavior_core::subject::{OverrideStatus, OverrideSubject};

    use crate::testing::{
        behavior, collaborators, override_row, FakeBackend, ACTIVATE, EMAIL, HANDLER_ORDER,
        HANDLER_SIGNUP,
    };

    fn selector(backend: &Arc<FakeBackend>) -> ActivationSelector {
        let collab = collaborators(Arc::clone(backend));
        ActivationSelector::new(
            BehaviorStore::new(collab.clone()),
            StatusResolver::new(collab),
        )
    }

    fn signup() -> HandlerRef {
        HandlerRef::Id(HANDLER_SIGNUP)
    }

    fn with_status(id: DbId, type_id: DbId, status: BehaviorStatus) -> EventBehavior {
        let mut b = behavior(id, HANDLER_SIGNUP, type_id);
        b.status = status;
        b
    }

    #[tokio::test]
    async fn keeps_active_behaviors_in_order() {
        let backend = FakeBackend::seeded();
        let mut first = with_status(2, EMAIL, BehaviorStatus::Active);
        first.sort_order = 5;
        backend.add_behavior(first);
        backend.add_behavior(with_status(1, ACTIVATE, BehaviorStatus::Active));
        backend.add_behavior(with_status(3, EMAIL, BehaviorStatus::Inactive));
        backend.add_behavior(with_status(4, EMAIL, BehaviorStatus::Default));
        backend.add_behavior(behavior(9, HANDLER_ORDER, EMAIL));

        let ctx = TriggerContext::new().with_var("x", 1);
        let active = selector(&backend).active_for(&signup(), &ctx).await.unwrap();
        assert_eq!(active.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn reserved_types_and_deleted_behaviors_are_never_selected() {
        let backend = FakeBackend::seeded();
        backend.add_behavior(with_status(1, 1, BehaviorStatus::Active));
        backend.add_behavior(with_status(2, 0, BehaviorStatus::Active));
        backend.add_behavior(with_status(3, EMAIL, BehaviorStatus::Deleted));
        for id in 1..=3 {
            backend.add_override(override_row(id, OverrideSubject::Everyone, OverrideStatus::Active));
        }

        let ctx = TriggerContext::new().with_var("x", 1);
        let active = selector(&backend).active_for(&signup(), &ctx).await.unwrap();
        assert!(active.is_empty());
        for id in 1..=3 {
            assert_eq!(backend.override_lookups(id), 0);
        }
    }

    #[tokio::test]
    async fn overrides_switch_behaviors_per_user() {
        let backend = FakeBackend::seeded();
        backend.add_behavior(with_status(5, EMAIL, BehaviorStatus::Active));
        backend.add_behavior(with_status(6, EMAIL, BehaviorStatus::Inactive));
        backend.add_override(override_row(5, OverrideSubject::User(10), OverrideStatus::Inactive));
        backend.add_override(override_row(6, OverrideSubject::AllUsers, OverrideStatus::Active));
        let selector = selector(&backend);

        let ctx = TriggerContext::new().with_user(UserRef::Id(10));
        let active = selector.active_for(&signup(), &ctx).await.unwrap();
        assert_eq!(active.keys().copied().collect::<Vec<_>>(), vec![6]);

        let anonymous = TriggerContext::new().with_var("x", 1);
        let active = selector.active_for(&signup(), &anonymous).await.unwrap();
        assert_eq!(active.keys().copied().collect::<Vec<_>>(), vec![5]);
    }

    #[tokio::test]
    async fn handler_without_behaviors_yields_empty_map() {
        let backend = FakeBackend::seeded();
        let ctx = TriggerContext::new().with_var("x", 1);
        let active = selector(&backend)
            .active_for(&HandlerRef::Id(HANDLER_ORDER), &ctx)
            .await
            .unwrap();
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn user_is_resolved_once_per_call() {
        let backend = FakeBackend::seeded();
        for id in 1..=3 {
            backend.add_behavior(with_status(id, EMAIL, BehaviorStatus::Active));
        }
        let (collab, users) = crate::testing::collaborators_counting_users(Arc::clone(&backend));
        let selector = ActivationSelector::new(
            BehaviorStore::new(collab.clone()),
            StatusResolver::new(collab),
        );

        let ctx = TriggerContext::new().with_user(UserRef::Login("jane".to_string()));
        selector.active_for(&signup(), &ctx).await.unwrap();
        assert_eq!(users.calls(), 1);
    }
}
