//! # Storage Module
//!
//! The chain data model and the reference chain the rest of the crate walks.
//!
//! ## Architecture
//!
//! ```text
//! block.rs  — Block structure, genesis, forging builder, signing, ids
//! chain.rs  — Chain trait, MemoryChain, snapshots, JSON chain files
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! Transaction → Block → MemoryChain ──snapshot──→ ChainSnapshot
//!                           │                          │
//!                        ChainFile                 dyn Chain
//!                        (JSON)              (anchor selection, fork checks)
//! ```
//!
//! ## Design Decisions
//!
//! 1. **SHA-256 ids.** Block and transaction ids are the first 8 bytes of a
//!    SHA-256 digest, read little-endian, as on every Burst-lineage chain.
//!
//! 2. **Arbitrary-precision difficulty.** Cumulative difficulty grows past
//!    `u64` within a few years of blocks, so it is a `BigUint` and travels
//!    as a decimal string in JSON.
//!
//! 3. **JSON snapshots.** The node keeps its chain in memory; persistence is
//!    a readable snapshot file, not a database.

pub mod block;
pub mod chain;

pub use block::{difficulty_increment, Block, BlockBuilder};
pub use chain::{Chain, ChainError, ChainFile, ChainResult, ChainSnapshot, MemoryChain};
