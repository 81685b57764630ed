//! # Hashing Utilities
//!
//! SHA-256 is the one hash of this chain. Block ids, transaction ids and
//! full hashes are all derived from it:
//!
//! - **full hash** — the 32-byte SHA-256 digest of an object's canonical bytes.
//! - **id** — the first 8 bytes of the full hash, read little-endian as a
//!   `u64`. Compact enough to index, wide enough that accidental collisions
//!   are a non-issue at chain scale.
//!
//! Ids are what the rest of the protocol passes around (`previous_block_id`,
//! `ec_block_id`). The full hash only shows up in logs and snapshots.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use burst_protocol::crypto::sha256;
///
/// let hash = sha256(b"burst");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Compute the SHA-256 hash and return a fixed-size array.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Derive a 64-bit object id from a full hash: the first 8 bytes, little-endian.
pub fn id_from_hash(full_hash: &[u8; 32]) -> u64 {
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&full_hash[..8]);
    u64::from_le_bytes(prefix)
}

/// Hash `data` and derive its id in one step.
pub fn id_of(data: &[u8]) -> u64 {
    id_from_hash(&sha256_array(data))
}

/// Hex rendering of the full hash of `data`.
pub fn full_hash_hex(data: &[u8]) -> String {
    hex::encode(sha256_array(data))
}
