//! Transaction verification: structural checks and cryptographic validation.
//!
//! [`verify_transaction`] is what the default `TransactionAuthenticator`
//! runs for every transaction inside a block visited by the fork verifier.
//! Checks go cheapest first; the Ed25519 verification is last.

use thiserror::Error;

use super::builder::Transaction;
use crate::config::{MAX_ATTACHMENT_BYTES, MAX_BALANCE_NQT};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during transaction verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    /// The stored id does not match the id derived from the signable bytes.
    #[error("transaction ID mismatch: expected {expected}, got {actual}")]
    IdMismatch { expected: u64, actual: u64 },

    /// Deadline of zero minutes: the transaction expires as it is created.
    #[error("deadline must be at least one minute")]
    ZeroDeadline,

    /// Amount outside `[0, MAX_BALANCE_NQT]`.
    #[error("amount {0} NQT exceeds the total supply")]
    AmountOutOfRange(u64),

    /// Fee outside `[0, MAX_BALANCE_NQT]`.
    #[error("fee {0} NQT exceeds the total supply")]
    FeeOutOfRange(u64),

    /// Attachment larger than the protocol allows.
    #[error("attachment is {size} bytes (max {max})")]
    AttachmentTooLarge { size: usize, max: usize },

    /// The transaction is not signed.
    #[error("transaction is unsigned")]
    MissingSignature,

    /// The signature does not verify against `sender_public_key`.
    #[error("invalid signature for sender {sender}")]
    InvalidSignature { sender: String },
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verifies a signed transaction for structural correctness and
/// cryptographic validity.
///
/// The checks, in order:
///
/// 1. **Deadline** — must be non-zero.
/// 2. **Ranges** — amount and fee must not exceed the total supply.
/// 3. **Attachment size** — bounded by [`MAX_ATTACHMENT_BYTES`].
/// 4. **Id integrity** — `id` must equal the id of the signable bytes.
/// 5. **Signature present**.
/// 6. **Signature valid** — Ed25519 against the embedded sender key.
///
/// # Errors
///
/// Returns the first failing check as a [`TransactionError`].
pub fn verify_transaction(tx: &Transaction) -> Result<(), TransactionError> {
    if tx.deadline == 0 {
        return Err(TransactionError::ZeroDeadline);
    }

    if tx.amount_nqt > MAX_BALANCE_NQT {
        return Err(TransactionError::AmountOutOfRange(tx.amount_nqt));
    }
    if tx.fee_nqt > MAX_BALANCE_NQT {
        return Err(TransactionError::FeeOutOfRange(tx.fee_nqt));
    }

    if tx.attachment.len() > MAX_ATTACHMENT_BYTES {
        return Err(TransactionError::AttachmentTooLarge {
            size: tx.attachment.len(),
            max: MAX_ATTACHMENT_BYTES,
        });
    }

    let signable = tx.signable_bytes();
    let expected_id = crate::crypto::hash::id_of(&signable);
    if tx.id != expected_id {
        return Err(TransactionError::IdMismatch {
            expected: expected_id,
            actual: tx.id,
        });
    }

    let signature = tx
        .signature
        .as_ref()
        .ok_or(TransactionError::MissingSignature)?;

    if !tx.sender_public_key.verify(&signable, signature) {
        return Err(TransactionError::InvalidSignature {
            sender: tx.sender_public_key.to_hex(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
