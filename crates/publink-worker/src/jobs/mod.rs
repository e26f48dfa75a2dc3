//! Job implementations.

pub mod digest;
pub mod session;
pub mod sweep;
