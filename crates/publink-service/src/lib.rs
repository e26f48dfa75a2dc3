//! Share-link domain logic.
//!
//! Owns the share metadata record, token generation, share creation,
//! the anonymous access gate, directory listing, and download markers.
//! Storage and mail are reached only through the traits in
//! `publink-core`, so everything here runs unchanged against the real
//! cluster or the in-memory store.

pub mod share;

pub use share::access::AccessService;
pub use share::record::ShareRecord;
pub use share::service::ShareService;
