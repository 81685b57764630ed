//! Block and transaction authentication hooks used during fork verification.
//!
//! The fork verifier never inspects signatures itself. It asks a
//! [`BlockAuthenticator`] and a [`TransactionAuthenticator`], so nodes with
//! other signature schemes or weight models can plug their own in.

use tracing::trace;

use crate::storage::Block;
use crate::transaction::{verify_transaction, Transaction};

/// Block-level checks and the economic weight a block contributes.
pub trait BlockAuthenticator: Send + Sync {
    /// `true` if the generator signature is valid.
    fn verify_signature(&self, block: &Block) -> bool;

    /// Economic weight of the block, in NQT.
    fn economic_weight(&self, block: &Block) -> u64;
}

/// Transaction-level check applied to every transaction inside a visited block.
pub trait TransactionAuthenticator: Send + Sync {
    /// `true` if the transaction's sender key actually signed it.
    fn verify_sender_key(&self, tx: &Transaction) -> bool;
}

/// Ed25519 block signatures; weight is value moved plus fees paid.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignedBlockAuthenticator;

impl BlockAuthenticator for SignedBlockAuthenticator {
    fn verify_signature(&self, block: &Block) -> bool {
        block.verify_signature()
    }

    fn economic_weight(&self, block: &Block) -> u64 {
        block.total_amount_nqt.saturating_add(block.total_fee_nqt)
    }
}

/// Full [`verify_transaction`] run: id integrity and Ed25519 signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignedTransactionAuthenticator;

impl TransactionAuthenticator for SignedTransactionAuthenticator {
    fn verify_sender_key(&self, tx: &Transaction) -> bool {
        match verify_transaction(tx) {
            Ok(()) => true,
            Err(e) => {
                trace!(tx = tx.id, error = %e, "sender key check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::BurstKeypair;
    use crate::storage::BlockBuilder;
    use crate::transaction::{sign_transaction, TransactionBuilder, TransactionType};

    fn signed_payment(kp: &BurstKeypair, amount: u64, fee: u64) -> Transaction {
        let mut tx = TransactionBuilder::new(TransactionType::Payment, kp.public_key())
            .recipient(5)
            .amount_nqt(amount)
            .fee_nqt(fee)
            .timestamp(10)
            .build();
        sign_transaction(&mut tx, kp);
        tx
    }

    #[test]
    fn weight_is_amount_plus_fee() {
        let kp = BurstKeypair::generate();
        let block = BlockBuilder::new(&Block::genesis())
            .transactions(vec![signed_payment(&kp, 700, 30), signed_payment(&kp, 300, 70)])
            .build();
        assert_eq!(SignedBlockAuthenticator.economic_weight(&block), 1_100);
    }

    #[test]
    fn weight_saturates() {
        let mut block = Block::genesis();
        block.total_amount_nqt = u64::MAX;
        block.total_fee_nqt = 1;
        assert_eq!(SignedBlockAuthenticator.economic_weight(&block), u64::MAX);
    }

    #[test]
    fn block_signature_check() {
        let forger = BurstKeypair::generate();
        let mut block = BlockBuilder::new(&Block::genesis())
            .generator(forger.public_key())
            .build();
        assert!(!SignedBlockAuthenticator.verify_signature(&block));
        block.sign(&forger);
        assert!(SignedBlockAuthenticator.verify_signature(&block));
    }

    #[test]
    fn sender_key_check() {
        let kp = BurstKeypair::generate();
        let mut tx = signed_payment(&kp, 1, 1);
        assert!(SignedTransactionAuthenticator.verify_sender_key(&tx));

        sign_transaction(&mut tx, &BurstKeypair::generate());
        assert!(!SignedTransactionAuthenticator.verify_sender_key(&tx));
    }
}
