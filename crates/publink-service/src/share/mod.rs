//! Share creation and access.

pub mod access;
pub mod marker;
pub mod record;
pub mod service;
pub mod token;
