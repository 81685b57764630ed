//! Transaction signing with Ed25519 keypairs.
//!
//! Signing is a separate step from building because the keypair may not
//! be available at construction time (remote signer, offline wallet). The
//! signed data is the canonical [`Transaction::signable_bytes`] output.

use super::builder::Transaction;
use crate::crypto::keys::BurstKeypair;

/// Signs a transaction in place using the provided keypair.
///
/// The caller is responsible for using the keypair that matches
/// `tx.sender_public_key`; a mismatched key produces a signature that
/// [`super::verify_transaction`] rejects.
///
/// # Example
///
/// ```rust,no_run
/// use burst_protocol::crypto::keys::BurstKeypair;
/// use burst_protocol::transaction::{sign_transaction, TransactionBuilder, TransactionType};
///
/// let keypair = BurstKeypair::generate();
/// let mut tx = TransactionBuilder::new(TransactionType::Payment, keypair.public_key())
///     .amount_nqt(1_000)
///     .build();
///
/// sign_transaction(&mut tx, &keypair);
/// assert!(tx.is_signed());
/// ```
pub fn sign_transaction<'a>(tx: &'a mut Transaction, keypair: &BurstKeypair) -> &'a Transaction {
    let signable = tx.signable_bytes();
    tx.signature = Some(keypair.sign(&signable));
    tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::builder::TransactionBuilder;
    use crate::transaction::types::TransactionType;

    fn unsigned(kp: &BurstKeypair) -> Transaction {
        TransactionBuilder::new(TransactionType::Payment, kp.public_key())
            .recipient(9)
            .amount_nqt(500)
            .timestamp(42)
            .build()
    }

    #[test]
    fn sign_sets_signature_field() {
        let kp = BurstKeypair::generate();
        let mut tx = unsigned(&kp);
        assert!(!tx.is_signed());
        sign_transaction(&mut tx, &kp);
        assert!(tx.is_signed());
    }

    #[test]
    fn signing_does_not_change_id() {
        let kp = BurstKeypair::generate();
        let mut tx = unsigned(&kp);
        let id_before = tx.id;
        sign_transaction(&mut tx, &kp);
        assert_eq!(tx.id, id_before, "signing must not change the transaction ID");
    }

    #[test]
    fn signature_verifies_against_sender() {
        let kp = BurstKeypair::generate();
        let mut tx = unsigned(&kp);
        sign_transaction(&mut tx, &kp);
        let sig = tx.signature.as_ref().unwrap();
        assert!(tx.sender_public_key.verify(&tx.signable_bytes(), sig));
    }

    #[test]
    fn signatures_are_deterministic() {
        let kp = BurstKeypair::from_seed(&[3u8; 32]);
        let mut a = unsigned(&kp);
        let mut b = unsigned(&kp);
        sign_transaction(&mut a, &kp);
        sign_transaction(&mut b, &kp);
        assert_eq!(a.signature, b.signature);
    }
}
