//! Traits implemented by the storage and mail crates.

pub mod mailer;
pub mod store;
