//! Event-to-behavior routing loop.
//!
//! [`BehaviorRouter`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and dispatches every received event. A failing event is logged and the
//! loop moves on to the next one.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::TriggeredEvent;
use crate::dispatcher::BehaviorDispatcher;

pub struct BehaviorRouter {
    dispatcher: BehaviorDispatcher,
}

impl BehaviorRouter {
    pub fn new(dispatcher: BehaviorDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Run the routing loop.
    ///
    /// Exits when the bus is closed (every [`EventBus`](crate::bus::EventBus)
    /// dropped) or `cancel` fires.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<TriggeredEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Behavior router cancelled");
                    break;
                }
                received = receiver.recv() => received,
            };
            match received {
                Ok(event) => self.route_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Behavior router lagged, some events were not dispatched");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, behavior router shutting down");
                    break;
                }
            }
        }
    }

    async fn route_event(&self, event: &TriggeredEvent) {
        if let Err(e) = self
            .dispatcher
            .dispatch(&event.handler, &event.context, &event.vars)
            .await
        {
            tracing::error!(
                error = %e,
                handler = %event.handler,
                "Failed to dispatch event"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
