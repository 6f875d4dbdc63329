//! Hashing helpers for values that must never be stored in the clear.

use sha2::{Digest, Sha256};

/// Computes the SHA-256 of the input as lowercase hex.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint under which a bearer token is stored in the sessions table.
pub fn token_fingerprint(token: &str) -> String {
    sha256_hex(token.trim())
}
