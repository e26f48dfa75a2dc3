//! HTTP handlers.

pub mod health;
pub mod public;
pub mod share;
