//! PostgreSQL `LISTEN` bridge.
//!
//! [`TriggerListener`] listens on two channels:
//!
//! | Channel                 | Payload                         | Effect                         |
//! |-------------------------|---------------------------------|--------------------------------|
//! | [`EVENTS_CHANNEL`]      | JSON [`TriggeredEvent`]         | published on the [`EventBus`]  |
//! | [`CACHE_CHANNEL`]       | ignored                         | behavior snapshot invalidated  |
//!
//! A lost connection also invalidates the snapshot, since cache
//! notifications sent before the reconnect are gone.
//!
//! Host code fires an event with
//! `SELECT pg_notify('behavior_events', '{"handler": "user.registered", ...}')`
//! and signals edited behaviors with `NOTIFY behavior_cache`.

use std::sync::Arc;

use behavior_db::DbPool;
use sqlx::postgres::PgListener;
use tokio_util::sync::CancellationToken;

use crate::bus::{EventBus, TriggeredEvent};
use crate::error::BehaviorResult;
use crate::store::BehaviorStore;

/// Channel carrying triggered events.
pub const EVENTS_CHANNEL: &str = "behavior_events";

/// Channel signalling that behaviors were edited.
pub const CACHE_CHANNEL: &str = "behavior_cache";

/// What to do with one notification.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationAction {
    Publish(TriggeredEvent),
    Invalidate,
    Ignore,
}

/// Decode a notification. Malformed event payloads are logged and ignored.
pub fn decode_notification(channel: &str, payload: &str) -> NotificationAction {
    match channel {
        EVENTS_CHANNEL => match serde_json::from_str::<TriggeredEvent>(payload) {
            Ok(event) => NotificationAction::Publish(event),
            Err(e) => {
                tracing::warn!(error = %e, payload, "Discarding malformed event notification");
                NotificationAction::Ignore
            }
        },
        CACHE_CHANNEL => NotificationAction::Invalidate,
        other => {
            tracing::debug!(channel = other, "Ignoring notification on unknown channel");
            NotificationAction::Ignore
        }
    }
}

/// Action for one receive attempt; `None` is a lost connection.
pub fn action_for(received: Option<(&str, &str)>) -> NotificationAction {
    match received {
        Some((channel, payload)) => decode_notification(channel, payload),
        None => {
            tracing::warn!("Trigger listener connection lost, reconnecting");
            NotificationAction::Invalidate
        }
    }
}

pub struct TriggerListener {
    pool: DbPool,
    bus: Arc<EventBus>,
    store: BehaviorStore,
}

impl TriggerListener {
    pub fn new(pool: DbPool, bus: Arc<EventBus>, store: BehaviorStore) -> Self {
        Self { pool, bus, store }
    }

    /// Run the listen loop until `cancel` fires.
    ///
    /// The listener reconnects on its own after a lost connection. Errors
    /// while reconnecting end the loop and are returned to the caller.
    pub async fn run(&self, cancel: CancellationToken) -> BehaviorResult<()> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen_all([EVENTS_CHANNEL, CACHE_CHANNEL]).await?;
        tracing::info!(
            events = EVENTS_CHANNEL,
            cache = CACHE_CHANNEL,
            "Trigger listener started"
        );

        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Trigger listener cancelled");
                    return Ok(());
                }
                received = listener.try_recv() => received?,
            };

            let action = action_for(received.as_ref().map(|n| (n.channel(), n.payload())));
            match action {
                NotificationAction::Publish(event) => {
                    let handler = event.handler.to_string();
                    let receivers = self.bus.publish(event);
                    tracing::debug!(handler = %handler, receivers, "Triggered event published");
                }
                NotificationAction::Invalidate => self.store.invalidate().await,
                NotificationAction::Ignore => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use behavior_core::behavior::HandlerRef;
    use behavior_core::context::UserRef;

    #[test]
    fn event_payload_is_published() {
        let action = decode_notification(
            EVENTS_CHANNEL,
            r#"{"handler": "user.registered", "context": {"user": 7}, "vars": {"plan": "gold"}}"#,
        );
        assert_matches!(action, NotificationAction::Publish(event) => {
            assert_eq!(event.handler, HandlerRef::from("user.registered"));
            assert_eq!(event.context.user, Some(UserRef::Id(7)));
            assert_eq!(event.vars["plan"], "gold");
        });
    }

    #[test]
    fn malformed_event_payload_is_ignored() {
        assert_eq!(
            decode_notification(EVENTS_CHANNEL, "not json"),
            NotificationAction::Ignore
        );
        assert_eq!(
            decode_notification(EVENTS_CHANNEL, r#"{"context": {}}"#),
            NotificationAction::Ignore
        );
    }

    #[test]
    fn lost_connection_invalidates() {
        assert_eq!(action_for(None), NotificationAction::Invalidate);
        assert_eq!(
            action_for(Some((CACHE_CHANNEL, ""))),
            NotificationAction::Invalidate
        );
        assert_eq!(action_for(Some(("other", "{}"))), NotificationAction::Ignore);
    }

    #[test]
    fn cache_channel_invalidates() {
        assert_eq!(decode_notification(CACHE_CHANNEL, ""), NotificationAction::Invalidate);
        assert_eq!(decode_notification("other", "{}"), NotificationAction::Ignore);
    }
}
