//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] carries [`TriggeredEvent`]s from whoever fires them (the
//! PostgreSQL [`TriggerListener`](crate::listener::TriggerListener) or host
//! code) to the [`BehaviorRouter`](crate::router::BehaviorRouter). It is
//! shared via `Arc<EventBus>`.

use behavior_core::behavior::HandlerRef;
use behavior_core::context::{TriggerContext, UserRef};
use behavior_core::types::Timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// TriggeredEvent
// ---------------------------------------------------------------------------

/// An application event whose handler's behaviors should run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredEvent {
    /// Handler id or unique name.
    pub handler: HandlerRef,

    /// Meta-vars of the firing event.
    #[serde(default)]
    pub context: TriggerContext,

    /// Template variables supplied alongside the context.
    #[serde(default)]
    pub vars: Map<String, Value>,

    /// When the event fired (UTC).
    #[serde(default = "Utc::now")]
    pub timestamp: Timestamp,
}

impl TriggeredEvent {
    pub fn new(handler: impl Into<HandlerRef>) -> Self {
        Self {
            handler: handler.into(),
            context: TriggerContext::default(),
            vars: Map::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_user(mut self, user: UserRef) -> Self {
        self.context.user = Some(user);
        self
    }

    /// Add a meta-var to the trigger context.
    pub fn with_context_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.vars.insert(key.into(), value.into());
        self
    }

    /// Add a template variable.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// When the buffer is full the oldest unconsumed events are dropped and slow
/// receivers observe `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<TriggeredEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns how many subscribers will see it; with none the event is
    /// dropped.
    pub fn publish(&self, event: TriggeredEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TriggeredEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = TriggeredEvent::new("order.completed")
            .with_user(UserRef::Id(7))
            .with_context_var("order_id", 12)
            .with_var("total", "9.99");
        assert_eq!(bus.publish(event), 1);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.handler, HandlerRef::from("order.completed"));
        assert_eq!(received.context.user, Some(UserRef::Id(7)));
        assert_eq!(received.context.vars["order_id"], 12);
        assert_eq!(received.vars["total"], "9.99");
    }

    #[test]
    fn publish_with_no_subscribers_drops_event() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(TriggeredEvent::new(3_i64)), 0);
    }

    #[test]
    fn deserializes_minimal_payload() {
        let event: TriggeredEvent = serde_json::from_value(json!({
            "handler": "user.registered",
            "context": {"user": 5}
        }))
        .unwrap();
        assert_eq!(event.handler, HandlerRef::Name("user.registered".to_string()));
        assert_eq!(event.context.user, Some(UserRef::Id(5)));
        assert!(event.vars.is_empty());

        let by_id: TriggeredEvent = serde_json::from_value(json!({"handler": 4})).unwrap();
        assert_eq!(by_id.handler, HandlerRef::Id(4));
    }
}
