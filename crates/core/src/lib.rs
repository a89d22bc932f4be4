//! Domain types and pure logic for event behaviors.
//!
//! Nothing in this crate touches the database or the network. The `db`
//! crate maps rows into these types and the `events` crate drives them
//! through the collaborator seams.

pub mod behavior;
pub mod behavior_type;
pub mod context;
pub mod error;
pub mod index;
pub mod subject;
pub mod template;
pub mod types;
