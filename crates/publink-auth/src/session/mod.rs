//! Session verification cache.

pub mod store;
