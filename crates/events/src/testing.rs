//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use behavior_core::behavior::{BehaviorStatus, EventBehavior, EventHandler, HandlerRef};
use behavior_core::behavior_type::{
    BehaviorType, TYPE_ACTIVATE_STATUS, TYPE_DEACTIVATE_STATUS, TYPE_DEFAULT, TYPE_EMAIL,
};
use behavior_core::context::{User, UserRef};
use behavior_core::subject::{OverrideStatus, OverrideSubject, StatusOverride};
use behavior_core::types::DbId;
use chrono::Utc;

use crate::collaborators::{
    BehaviorPersistence, Collaborators, EventHandlerLookup, Mailer, PassthroughUserResolver,
    UserResolver,
};
use crate::delivery::email::OutgoingEmail;
use crate::error::BehaviorResult;

pub const HANDLER_SIGNUP: DbId = 1;
pub const HANDLER_ORDER: DbId = 2;

pub const EMAIL: DbId = 2;
pub const ACTIVATE: DbId = 3;
pub const DEACTIVATE: DbId = 4;

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// An active behavior with empty template fields.
pub fn behavior(id: DbId, handler: DbId, type_id: DbId) -> EventBehavior {
    let type_name = match type_id {
        1 => TYPE_DEFAULT,
        EMAIL => TYPE_EMAIL,
        ACTIVATE => TYPE_ACTIVATE_STATUS,
        DEACTIVATE => TYPE_DEACTIVATE_STATUS,
        _ => "custom",
    };
    EventBehavior {
        id,
        name: None,
        event_handler_id: handler,
        behavior_type_id: type_id,
        behavior_type: type_name.to_string(),
        sort_order: 0,
        status: BehaviorStatus::Active,
        message: String::new(),
        subject: String::new(),
        from_name: String::new(),
        from_addr: String::new(),
        recipients: String::new(),
        headers: None,
        attachments: None,
        this_event_behavior_id: None,
        user_id: None,
        user_passtag_id: None,
    }
}

/// An active email behavior that sends as-is.
pub fn email_behavior(id: DbId, handler: DbId) -> EventBehavior {
    EventBehavior {
        from_name: "Shop".to_string(),
        from_addr: "shop@example.com".to_string(),
        recipients: "jane@example.com".to_string(),
        subject: "Welcome".to_string(),
        message: "Hello".to_string(),
        ..behavior(id, handler, EMAIL)
    }
}

pub fn override_row(
    behavior_id: DbId,
    subject: OverrideSubject,
    status: OverrideStatus,
) -> StatusOverride {
    StatusOverride {
        event_behavior_id: behavior_id,
        subject,
        status,
        time: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// FakeBackend
// ---------------------------------------------------------------------------

/// Handler registry and persistence held in memory, with call counters.
#[derive(Default)]
pub struct FakeBackend {
    handlers: Vec<EventHandler>,
    types: Vec<BehaviorType>,
    behaviors: Mutex<Vec<EventBehavior>>,
    overrides: Mutex<Vec<StatusOverride>>,
    loads: AtomicUsize,
    handler_lookups: AtomicUsize,
    override_lookups: Mutex<HashMap<DbId, usize>>,
}

impl FakeBackend {
    /// Two handlers and the four seeded behavior types, no behaviors.
    pub fn seeded() -> Arc<Self> {
        Arc::new(Self {
            handlers: vec![
                EventHandler {
                    id: HANDLER_SIGNUP,
                    name: "user.registered".to_string(),
                },
                EventHandler {
                    id: HANDLER_ORDER,
                    name: "order.completed".to_string(),
                },
            ],
            types: vec![
                BehaviorType::new(1, TYPE_DEFAULT),
                BehaviorType::new(EMAIL, TYPE_EMAIL),
                BehaviorType::new(ACTIVATE, TYPE_ACTIVATE_STATUS),
                BehaviorType::new(DEACTIVATE, TYPE_DEACTIVATE_STATUS),
            ],
            ..Self::default()
        })
    }

    pub fn add_behavior(&self, behavior: EventBehavior) {
        self.behaviors.lock().unwrap().push(behavior);
    }

    pub fn add_override(&self, row: StatusOverride) {
        self.overrides.lock().unwrap().push(row);
    }

    pub fn overrides(&self) -> Vec<StatusOverride> {
        self.overrides.lock().unwrap().clone()
    }

    /// Number of full behavior loads.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn handler_lookups(&self) -> usize {
        self.handler_lookups.load(Ordering::SeqCst)
    }

    pub fn override_lookups(&self, behavior_id: DbId) -> usize {
        self.override_lookups
            .lock()
            .unwrap()
            .get(&behavior_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventHandlerLookup for FakeBackend {
    async fn get(&self, handler: &HandlerRef) -> BehaviorResult<Option<EventHandler>> {
        self.handler_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.handlers.iter().find(|h| handler.matches(h)).cloned())
    }
}

#[async_trait]
impl BehaviorPersistence for FakeBackend {
    async fn load_behavior_types(&self) -> BehaviorResult<Vec<BehaviorType>> {
        Ok(self.types.clone())
    }

    async fn load_behaviors(&self) -> BehaviorResult<Vec<EventBehavior>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.behaviors.lock().unwrap().clone())
    }

    async fn overrides_for(&self, behavior_id: DbId) -> BehaviorResult<Vec<StatusOverride>> {
        *self
            .override_lookups
            .lock()
            .unwrap()
            .entry(behavior_id)
            .or_default() += 1;
        Ok(self
            .overrides
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.event_behavior_id == behavior_id)
            .cloned()
            .collect())
    }

    async fn upsert_override(&self, row: &StatusOverride) -> BehaviorResult<()> {
        let mut rows = self.overrides.lock().unwrap();
        match rows
            .iter_mut()
            .find(|o| o.event_behavior_id == row.event_behavior_id && o.subject == row.subject)
        {
            Some(existing) => *existing = row.clone(),
            None => rows.push(row.clone()),
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mailer and user resolver
// ---------------------------------------------------------------------------

/// Keeps every email instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> BehaviorResult<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Passthrough resolution that counts its calls.
#[derive(Default)]
pub struct CountingUsers {
    calls: AtomicUsize,
}

impl CountingUsers {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserResolver for CountingUsers {
    async fn which(&self, user: &UserRef) -> BehaviorResult<User> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        PassthroughUserResolver.which(user).await
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub fn collaborators(backend: Arc<FakeBackend>) -> Collaborators {
    Collaborators::new(backend, Arc::new(RecordingMailer::default()))
}

pub fn collaborators_with_mailer(
    backend: Arc<FakeBackend>,
    mailer: Arc<RecordingMailer>,
) -> Collaborators {
    Collaborators::new(backend, mailer)
}

pub fn collaborators_counting_users(backend: Arc<FakeBackend>) -> (Collaborators, Arc<CountingUsers>) {
    let users = Arc::new(CountingUsers::default());
    let collab = collaborators(backend).with_users(users.clone());
    (collab, users)
}
