//! # Transaction Module
//!
//! Construction, signing and verification of chain transactions.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        — TransactionType / TransactionStatus
//! builder.rs      — Transaction + fluent TransactionBuilder (EC anchor stamping)
//! signing.rs      — Ed25519 signing over the canonical bytes
//! verification.rs — id integrity and signature validation
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Anchor** — ask `AnchorSelector::select_anchor` for the EC block
//!    matching the intended timestamp.
//! 2. **Build** — [`TransactionBuilder`] with [`TransactionBuilder::ec_anchor`].
//! 3. **Sign** — [`sign_transaction`] with the sender's keypair.
//! 4. **Admit** — peers run the fork verifier before pooling it.
//! 5. **Include** — forgers pick it from the pool into a block.
//!
//! ## Design Decisions
//!
//! - Ids are the first 8 bytes of SHA-256 over the signable bytes, so they
//!   commit to the EC anchor and survive signing unchanged.
//! - All amounts are `u64` NQT. No floating point anywhere near money.
//! - The attachment is opaque bytes; its semantics belong to the
//!   type-specific handlers outside this crate.

pub mod builder;
pub mod signing;
pub mod types;
pub mod verification;

pub use builder::{Transaction, TransactionBuilder};
pub use signing::sign_transaction;
pub use types::{TransactionStatus, TransactionType};
pub use verification::{verify_transaction, TransactionError};
