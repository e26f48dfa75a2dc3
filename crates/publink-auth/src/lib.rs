//! Authentication primitives for Publink.
//!
//! Covers the two auth concerns of the service: Argon2id hashing for
//! share passwords, and the in-process cache that remembers which
//! sessions have already presented a valid password for a given link.

pub mod password;
pub mod session;

pub use password::hasher::PasswordHasher;
pub use session::store::SessionAuthCache;

use sha2::{Digest, Sha256};

/// Constant-time comparison of two secrets by comparing their SHA-256
/// digests. Used for the share-creation access key, which is a single
/// configured value rather than a per-user credential.
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    let a = Sha256::digest(provided.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a == b
}
