//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row and, where rows are written, a `Deserialize` create DTO. Rows convert
//! into `behavior_core` domain types.

pub mod behavior_status;
pub mod behavior_type;
pub mod event_behavior;
pub mod event_handler;
