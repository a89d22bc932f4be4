//! Event behavior resolution and execution.
//!
//! This crate turns a firing event into executed behaviors:
//!
//! - [`BehaviorStore`]: cached, indexed snapshot of every behavior.
//! - [`StatusResolver`]: effective status of a behavior for a trigger,
//!   honoring user, passtag and global overrides.
//! - [`ActivationSelector`]: the active behaviors of an event handler.
//! - [`EmailProcessor`] / [`StatusProcessor`]: execute one behavior.
//! - [`BehaviorDispatcher`]: selector plus processors for one event.
//! - [`EventBus`] / [`BehaviorRouter`] / [`TriggerListener`]: feed events
//!   from PostgreSQL notifications through the dispatcher.
//!
//! Every external concern sits behind a trait in [`collaborators`].

pub mod backend;
pub mod bus;
pub mod collaborators;
pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod processors;
pub mod resolver;
pub mod router;
pub mod selector;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::PgBackend;
pub use bus::{EventBus, TriggeredEvent};
pub use collaborators::Collaborators;
pub use delivery::email::{DisabledMailer, EmailConfig, OutgoingEmail, SmtpMailer};
pub use dispatcher::{BehaviorDispatcher, DispatchReport};
pub use error::{BehaviorError, BehaviorResult};
pub use listener::TriggerListener;
pub use processors::{EmailProcessor, Outcome, SkipReason, StatusProcessor};
pub use resolver::StatusResolver;
pub use router::BehaviorRouter;
pub use selector::ActivationSelector;
pub use store::BehaviorStore;
