//! External delivery channels for executed behaviors.

pub mod email;
