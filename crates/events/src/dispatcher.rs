//! Runs every active behavior of a firing event.

use behavior_core::behavior::{BehaviorRef, HandlerRef};
use behavior_core::behavior_type::BehaviorKind;
use behavior_core::context::TriggerContext;
use behavior_core::types::DbId;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::collaborators::Collaborators;
use crate::error::BehaviorResult;
use crate::processors::{EmailProcessor, Outcome, StatusProcessor};
use crate::resolver::StatusResolver;
use crate::selector::ActivationSelector;
use crate::store::BehaviorStore;

/// Ids of the behaviors a dispatch executed and skipped, in run order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub processed: Vec<DbId>,
    pub skipped: Vec<DbId>,
}

/// Selector plus processors, wired from one set of collaborators.
#[derive(Clone)]
pub struct BehaviorDispatcher {
    store: BehaviorStore,
    selector: ActivationSelector,
    email: EmailProcessor,
    status: StatusProcessor,
}

impl BehaviorDispatcher {
    pub fn new(collab: Collaborators) -> Self {
        let store = BehaviorStore::new(collab.clone());
        let resolver = StatusResolver::new(collab);
        Self {
            selector: ActivationSelector::new(store.clone(), resolver),
            email: EmailProcessor::new(store.clone()),
            status: StatusProcessor::new(store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &BehaviorStore {
        &self.store
    }

    /// Select the active behaviors of `handler` and run each one.
    ///
    /// The first processor error aborts the dispatch.
    pub async fn dispatch(
        &self,
        handler: &HandlerRef,
        context: &TriggerContext,
        vars: &Map<String, Value>,
    ) -> BehaviorResult<DispatchReport> {
        context.validate()?;
        let user = self.store.collaborators().resolve_user(context).await?;
        let context = context.with_resolved_user(user);

        let active = self.selector.active_for(handler, &context).await?;
        let mut report = DispatchReport::default();
        for (id, behavior) in &active {
            let target = BehaviorRef::Id(*id);
            let outcome = match BehaviorKind::from_name(&behavior.behavior_type) {
                BehaviorKind::Email => self.email.process(&target, &context, vars).await?,
                kind if kind.is_status() => self.status.process(&target, &context, vars).await?,
                kind => {
                    tracing::debug!(behavior_id = id, behavior_type = %kind, "No processor for behavior type");
                    report.skipped.push(*id);
                    continue;
                }
            };
            match outcome {
                Outcome::Executed => report.processed.push(*id),
                Outcome::Skipped(_) => report.skipped.push(*id),
            }
        }

        tracing::info!(
            handler = %handler,
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            "Event dispatched"
        );
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
