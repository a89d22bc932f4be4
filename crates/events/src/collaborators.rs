//! Seams to everything outside the engine.
//!
//! Each collaborator is a `Send + Sync` trait object injected once through
//! [`Collaborators`]. Production adapters live next to the trait they
//! implement ([`MemoryCache`], [`PassthroughUserResolver`],
//! [`CodeTemplateEngine`]) or in [`crate::backend`] and [`crate::delivery`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use behavior_core::behavior::{EventBehavior, EventHandler, HandlerRef};
use behavior_core::behavior_type::BehaviorType;
use behavior_core::context::{TriggerContext, User, UserRef};
use behavior_core::error::CoreError;
use behavior_core::index::BehaviorIndex;
use behavior_core::subject::StatusOverride;
use behavior_core::template;
use behavior_core::types::DbId;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::delivery::email::OutgoingEmail;
use crate::error::BehaviorResult;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Host registry of event handlers.
#[async_trait]
pub trait EventHandlerLookup: Send + Sync {
    async fn get(&self, handler: &HandlerRef) -> BehaviorResult<Option<EventHandler>>;
}

/// Storage of behaviors and their status overrides.
#[async_trait]
pub trait BehaviorPersistence: Send + Sync {
    async fn load_behavior_types(&self) -> BehaviorResult<Vec<BehaviorType>>;

    /// Every behavior, joined with its type name.
    async fn load_behaviors(&self) -> BehaviorResult<Vec<EventBehavior>>;

    /// Every override row of one behavior.
    async fn overrides_for(&self, behavior_id: DbId) -> BehaviorResult<Vec<StatusOverride>>;

    /// Insert or replace the row keyed by behavior and subject.
    async fn upsert_override(&self, row: &StatusOverride) -> BehaviorResult<()>;
}

/// Keyed cache holding behavior snapshots.
#[async_trait]
pub trait BehaviorCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Arc<BehaviorIndex>>;

    /// Store `value` under `key` and hand it back.
    async fn update(&self, key: &str, value: Arc<BehaviorIndex>) -> Arc<BehaviorIndex>;

    async fn invalidate(&self, key: &str);
}

/// Substitution and expression evaluation for template fields.
pub trait TemplateEngine: Send + Sync {
    fn substitute(&self, text: &str, scope: &Map<String, Value>) -> String;

    /// Render a message. Scope values must never be read as template source.
    fn evaluate(&self, text: &str, scope: &Map<String, Value>) -> Result<String, CoreError>;
}

/// Outbound mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> BehaviorResult<()>;

    /// Whether sent mail actually leaves the process.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Turns a user reference into a concrete user.
#[async_trait]
pub trait UserResolver: Send + Sync {
    async fn which(&self, user: &UserRef) -> BehaviorResult<User>;
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// The full set of injected collaborators.
#[derive(Clone)]
pub struct Collaborators {
    pub handlers: Arc<dyn EventHandlerLookup>,
    pub persistence: Arc<dyn BehaviorPersistence>,
    pub cache: Arc<dyn BehaviorCache>,
    pub templates: Arc<dyn TemplateEngine>,
    pub mailer: Arc<dyn Mailer>,
    pub users: Arc<dyn UserResolver>,
}

impl Collaborators {
    /// Wire a backend that serves both handler lookups and persistence, with
    /// the in-process cache, code templates and passthrough user resolution.
    pub fn new<B>(backend: Arc<B>, mailer: Arc<dyn Mailer>) -> Self
    where
        B: EventHandlerLookup + BehaviorPersistence + 'static,
    {
        Self {
            handlers: backend.clone(),
            persistence: backend,
            cache: Arc::new(MemoryCache::default()),
            templates: Arc::new(CodeTemplateEngine),
            mailer,
            users: Arc::new(PassthroughUserResolver),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn BehaviorCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_users(mut self, users: Arc<dyn UserResolver>) -> Self {
        self.users = users;
        self
    }

    /// Look up a handler, failing with `HandlerMissing` when it is unknown.
    pub async fn require_handler(&self, handler: &HandlerRef) -> BehaviorResult<EventHandler> {
        handler.validate()?;
        self.handlers
            .get(handler)
            .await?
            .ok_or_else(|| CoreError::HandlerMissing(handler.to_string()).into())
    }

    /// Resolve the context's user reference, if it carries one.
    pub async fn resolve_user(&self, context: &TriggerContext) -> BehaviorResult<Option<User>> {
        match &context.user {
            None => Ok(None),
            Some(UserRef::Resolved(user)) => Ok(Some(user.clone())),
            Some(user) => self.users.which(user).await.map(Some),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryCache
// ---------------------------------------------------------------------------

/// In-process cache. Each entry is replaced as a whole under the lock.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Arc<BehaviorIndex>>>,
}

#[async_trait]
impl BehaviorCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Arc<BehaviorIndex>> {
        self.entries.read().await.get(key).cloned()
    }

    async fn update(&self, key: &str, value: Arc<BehaviorIndex>) -> Arc<BehaviorIndex> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), Arc::clone(&value));
        value
    }

    async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
    }
}

// ---------------------------------------------------------------------------
// PassthroughUserResolver
// ---------------------------------------------------------------------------

/// Resolves references without a user directory.
///
/// A numeric id becomes a user with that id and no passtags; a login becomes
/// a visitor carrying only the login.
#[derive(Debug, Default)]
pub struct PassthroughUserResolver;

#[async_trait]
impl UserResolver for PassthroughUserResolver {
    async fn which(&self, user: &UserRef) -> BehaviorResult<User> {
        Ok(match user {
            UserRef::Id(id) => User::with_id(*id),
            UserRef::Login(login) => User {
                login: Some(login.clone()),
                ..User::anonymous()
            },
            UserRef::Resolved(user) => user.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// CodeTemplateEngine
// ---------------------------------------------------------------------------

/// `%%code%%` replacement plus `minijinja` expressions.
#[derive(Debug, Default)]
pub struct CodeTemplateEngine;

impl TemplateEngine for CodeTemplateEngine {
    fn substitute(&self, text: &str, scope: &Map<String, Value>) -> String {
        template::replace_codes(text, scope)
    }

    fn evaluate(&self, text: &str, scope: &Map<String, Value>) -> Result<String, CoreError> {
        template::render_message(text, scope)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
