//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Every value reaches the server as
//! a bound parameter.

pub mod behavior_status_repo;
pub mod behavior_type_repo;
pub mod event_behavior_repo;
pub mod event_handler_repo;

pub use behavior_status_repo::BehaviorStatusRepo;
pub use behavior_type_repo::BehaviorTypeRepo;
pub use event_behavior_repo::EventBehaviorRepo;
pub use event_handler_repo::EventHandlerRepo;
