//! # Cryptographic Primitives
//!
//! Everything security-related in the protocol flows through here:
//!
//! - **SHA-256** for full hashes and the 64-bit ids derived from them.
//! - **Ed25519** for block and transaction signatures.
//! - **Constant-time comparison** for ids and heights supplied by peers.
//!
//! Everything here is a thin, type-safe wrapper around audited
//! implementations. We don't roll our own.

pub mod ct;
pub mod hash;
pub mod keys;

pub use ct::ct_eq_u64;
pub use hash::{full_hash_hex, id_from_hash, id_of, sha256, sha256_array};
pub use keys::{BurstKeypair, BurstPublicKey, BurstSignature, KeyError};
