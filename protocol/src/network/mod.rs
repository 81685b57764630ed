//! # Network Module
//!
//! Where peer input meets the chain. Transactions relayed by peers land in
//! the unconfirmed pool, and the pool is the first place their EC anchor is
//! checked.
//!
//! ## Architecture
//!
//! ```text
//! mempool.rs  — Priority-ordered unconfirmed transaction pool with EC admission
//! ```
//!
//! ## Design Decisions
//!
//! - The pool is protected by `parking_lot::RwLock` rather than `tokio::Mutex`
//!   because pool reads vastly outnumber writes, and forging wants cheap reads.
//! - The pool shares the node's `ForkVerifier` through an `Arc` instead of
//!   owning a chain of its own.

pub mod mempool;

pub use mempool::{Mempool, MempoolConfig, MempoolEntry, MempoolError};
