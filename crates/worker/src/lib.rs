//! Background worker that runs event behaviors.

pub mod config;
