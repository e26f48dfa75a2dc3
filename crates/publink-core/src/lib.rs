//! Core building blocks shared by every Publink crate.
//!
//! Defines the unified error type, configuration schemas, pagination types,
//! and the traits implemented by the storage and mail crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
