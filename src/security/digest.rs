//! Content hashing for stored and rejected payloads.

use sha2::{Digest, Sha256};

/// SHA-256 of the content, hex encoded.
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
