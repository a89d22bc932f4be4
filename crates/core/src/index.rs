//! Indexed snapshot of every configured event behavior.
//!
//! Behaviors are stored once, in `sort_order`, and every index maps a key to
//! positions in that canonical list. A snapshot is immutable after
//! [`BehaviorIndex::build`]; a reload produces a new snapshot.

use std::collections::HashMap;

use crate::behavior::EventBehavior;
use crate::behavior_type::{BehaviorTypeRegistry, NONE_TYPE_ID, TYPE_NONE};
use crate::types::DbId;

#[derive(Debug, Clone, Default)]
pub struct BehaviorIndex {
    types: BehaviorTypeRegistry,
    behaviors: Vec<EventBehavior>,
    by_id: HashMap<DbId, usize>,
    by_name: HashMap<String, usize>,
    by_behavior_type_id: HashMap<DbId, Vec<usize>>,
    by_behavior_type: HashMap<String, Vec<usize>>,
    by_event_handler_id: HashMap<DbId, Vec<usize>>,
}

impl BehaviorIndex {
    /// Build a snapshot from loaded behaviors.
    ///
    /// Behaviors are ordered by `sort_order` ascending; equal orders keep the
    /// order they were loaded in. Behaviors of the `default` type are
    /// normalized to `none` / `0`.
    pub fn build(types: BehaviorTypeRegistry, mut behaviors: Vec<EventBehavior>) -> Self {
        behaviors.sort_by_key(|b| b.sort_order);

        if let Some(default_id) = types.default_type_id() {
            for behavior in behaviors.iter_mut() {
                if behavior.behavior_type_id == default_id {
                    behavior.behavior_type = TYPE_NONE.to_string();
                    behavior.behavior_type_id = NONE_TYPE_ID;
                }
            }
        }

        let mut index = Self {
            types,
            ..Self::default()
        };
        for (pos, behavior) in behaviors.iter().enumerate() {
            index.by_id.insert(behavior.id, pos);
            if let Some(name) = behavior.name.as_ref().filter(|n| !n.is_empty()) {
                index.by_name.insert(name.clone(), pos);
            }
            index
                .by_behavior_type_id
                .entry(behavior.behavior_type_id)
                .or_default()
                .push(pos);
            index
                .by_behavior_type
                .entry(behavior.behavior_type.clone())
                .or_default()
                .push(pos);
            index
                .by_event_handler_id
                .entry(behavior.event_handler_id)
                .or_default()
                .push(pos);
        }
        index.behaviors = behaviors;
        index
    }

    pub fn types(&self) -> &BehaviorTypeRegistry {
        &self.types
    }

    pub fn get(&self, id: DbId) -> Option<&EventBehavior> {
        self.by_id.get(&id).map(|pos| &self.behaviors[*pos])
    }

    pub fn get_by_name(&self, name: &str) -> Option<&EventBehavior> {
        self.by_name.get(name).map(|pos| &self.behaviors[*pos])
    }

    /// Behaviors of one event handler, in `sort_order`.
    pub fn for_event_handler(&self, handler_id: DbId) -> impl Iterator<Item = &EventBehavior> {
        self.positions(self.by_event_handler_id.get(&handler_id))
    }

    pub fn for_behavior_type_id(&self, type_id: DbId) -> impl Iterator<Item = &EventBehavior> {
        self.positions(self.by_behavior_type_id.get(&type_id))
    }

    pub fn for_behavior_type(&self, type_name: &str) -> impl Iterator<Item = &EventBehavior> {
        self.positions(self.by_behavior_type.get(type_name))
    }

    /// All behaviors, in `sort_order`.
    pub fn iter(&self) -> impl Iterator<Item = &EventBehavior> {
        self.behaviors.iter()
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    fn positions<'a>(
        &'a self,
        bucket: Option<&'a Vec<usize>>,
    ) -> impl Iterator<Item = &'a EventBehavior> + 'a {
        bucket
            .into_iter()
            .flatten()
            .map(move |pos| &self.behaviors[*pos])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
