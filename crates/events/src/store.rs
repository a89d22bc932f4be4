//! Cached, indexed view of every configured behavior.
//!
//! [`BehaviorStore::get_all`] is the only path that reads behaviors from
//! persistence. The resulting [`BehaviorIndex`] is kept in the injected cache
//! under [`GET_ALL_CACHE_KEY`] and shared as an `Arc` until the key is
//! invalidated. Lookups hand out owned copies so callers can substitute
//! template fields without touching the snapshot.

use std::sync::Arc;

use behavior_core::behavior::{BehaviorRef, EventBehavior, HandlerRef};
use behavior_core::behavior_type::{BehaviorType, BehaviorTypeRegistry};
use behavior_core::error::CoreError;
use behavior_core::index::BehaviorIndex;
use behavior_core::types::DbId;

use crate::collaborators::Collaborators;
use crate::error::BehaviorResult;

/// Cache key of the full behavior snapshot.
pub const GET_ALL_CACHE_KEY: &str = "behavior_store.get_all";

#[derive(Clone)]
pub struct BehaviorStore {
    collab: Collaborators,
}

impl BehaviorStore {
    pub fn new(collab: Collaborators) -> Self {
        Self { collab }
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collab
    }

    /// The full snapshot, loading and caching it on first use.
    pub async fn get_all(&self) -> BehaviorResult<Arc<BehaviorIndex>> {
        if let Some(index) = self.collab.cache.get(GET_ALL_CACHE_KEY).await {
            return Ok(index);
        }

        let types = self.collab.persistence.load_behavior_types().await?;
        let behaviors = self.collab.persistence.load_behaviors().await?;
        let index = BehaviorIndex::build(BehaviorTypeRegistry::new(types), behaviors);
        tracing::debug!(
            behaviors = index.len(),
            types = index.types().len(),
            "Behavior snapshot loaded"
        );

        Ok(self
            .collab
            .cache
            .update(GET_ALL_CACHE_KEY, Arc::new(index))
            .await)
    }

    pub async fn get(&self, id: DbId) -> BehaviorResult<Option<EventBehavior>> {
        Ok(self.get_all().await?.get(id).cloned())
    }

    pub async fn get_by_name(&self, name: &str) -> BehaviorResult<Option<EventBehavior>> {
        Ok(self.get_all().await?.get_by_name(name).cloned())
    }

    /// Look up a behavior by id or name.
    pub async fn get_behavior(&self, behavior: &BehaviorRef) -> BehaviorResult<Option<EventBehavior>> {
        behavior.validate()?;
        match behavior {
            BehaviorRef::Id(id) => self.get(*id).await,
            BehaviorRef::Name(name) => self.get_by_name(name).await,
        }
    }

    /// Like [`get_behavior`](Self::get_behavior), failing with
    /// `BehaviorMissing` when nothing matches.
    pub async fn require_behavior(&self, behavior: &BehaviorRef) -> BehaviorResult<EventBehavior> {
        self.get_behavior(behavior)
            .await?
            .ok_or_else(|| CoreError::BehaviorMissing(behavior.to_string()).into())
    }

    pub async fn behavior_type(&self, type_id: DbId) -> BehaviorResult<Option<BehaviorType>> {
        Ok(self.get_all().await?.types().get(type_id).cloned())
    }

    /// Behaviors of one handler, in `sort_order`.
    pub async fn for_handler(&self, handler: &HandlerRef) -> BehaviorResult<Vec<EventBehavior>> {
        let handler = self.collab.require_handler(handler).await?;
        let index = self.get_all().await?;
        Ok(index.for_event_handler(handler.id).cloned().collect())
    }

    /// Drop the cached snapshot; the next read reloads it.
    pub async fn invalidate(&self) {
        self.collab.cache.invalidate(GET_ALL_CACHE_KEY).await;
        tracing::debug!("Behavior snapshot invalidated");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
