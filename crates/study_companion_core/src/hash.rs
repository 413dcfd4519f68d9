//! crates/study_companion_core/src/hash.rs
//!
//! Password digests.
//!
//! # Security
//!
//! `password_digest` is a single unsalted SHA-256 pass. It is deterministic and
//! fast, which makes stored digests vulnerable to precomputed-table and brute
//! force attacks. It is kept for compatibility with existing `users-db` data and
//! must not be treated as real password hardening.

use sha2::{Digest, Sha256};

/// Length of a digest in hex characters.
pub const DIGEST_HEX_LEN: usize = 64;

/// Returns the lowercase hex SHA-256 digest of `plaintext`.
pub fn password_digest(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}
