//! Shared fixtures for the integration tests.
//!
//! Builds realistic signed chains: one block every 240 seconds, each block
//! carrying a fee-paying payment anchored ten blocks below it, so every
//! stretch of chain has economic weight.

#![allow(dead_code)]

use std::sync::Arc;

use burst_protocol::config::{EcParams, ONE_COIN};
use burst_protocol::consensus::{Collaborators, FluxSchedule};
use burst_protocol::crypto::keys::BurstKeypair;
use burst_protocol::storage::{Block, BlockBuilder, Chain, MemoryChain};
use burst_protocol::transaction::{sign_transaction, Transaction, TransactionBuilder, TransactionType};

pub struct TestChain {
    pub chain: Arc<MemoryChain>,
    pub forger: BurstKeypair,
    pub payer: BurstKeypair,
}

impl TestChain {
    /// Genesis plus `len` signed blocks.
    pub fn build(len: u64) -> Self {
        let test_chain = Self {
            chain: Arc::new(MemoryChain::new()),
            forger: BurstKeypair::from_seed(&[0x11; 32]),
            payer: BurstKeypair::from_seed(&[0x22; 32]),
        };
        test_chain.extend(len);
        test_chain
    }

    /// Forge `count` more blocks on the tip.
    pub fn extend(&self, count: u64) {
        for _ in 0..count {
            let tip = self.tip();
            let anchor = self.at(tip.height.saturating_sub(9));
            let fee_tx = self.payment(&self.payer, &anchor, tip.timestamp, ONE_COIN);
            self.forge_on(&tip, vec![fee_tx]);
        }
    }

    /// Sign and append a block on `parent` holding `transactions`.
    pub fn forge_on(&self, parent: &Block, transactions: Vec<Transaction>) -> Arc<Block> {
        let mut block = BlockBuilder::new(parent)
            .generator(self.forger.public_key())
            .transactions(transactions)
            .build();
        block.sign(&self.forger);
        self.chain.append(block).expect("fixture block must extend the tip")
    }

    /// A signed block at the same height as the canonical block at `height`,
    /// but never appended: a competing fork's block.
    pub fn fork_block_at(&self, height: u64) -> Block {
        let parent = self.at(height - 1);
        let rival = BurstKeypair::from_seed(&[0x33; 32]);
        let mut block = BlockBuilder::new(&parent)
            .timestamp(parent.timestamp + 200)
            .generator(rival.public_key())
            .build();
        block.sign(&rival);
        block
    }

    pub fn payment(
        &self,
        sender: &BurstKeypair,
        anchor: &Block,
        timestamp: u32,
        fee_nqt: u64,
    ) -> Transaction {
        let mut tx = TransactionBuilder::new(TransactionType::Payment, sender.public_key())
            .recipient(0xB0B)
            .amount_nqt(5 * ONE_COIN)
            .fee_nqt(fee_nqt)
            .timestamp(timestamp)
            .ec_anchor(anchor)
            .build();
        sign_transaction(&mut tx, sender);
        tx
    }

    /// Fresh transaction stamped with the tip timestamp, anchored at `height`.
    pub fn tx_anchored_at(&self, sender: &BurstKeypair, height: u64) -> Transaction {
        let anchor = self.at(height);
        self.payment(sender, &anchor, self.tip().timestamp, ONE_COIN / 10)
    }

    pub fn tip(&self) -> Arc<Block> {
        self.chain.tip().expect("chain always holds genesis")
    }

    pub fn at(&self, height: u64) -> Arc<Block> {
        self.chain
            .block_at_height(height)
            .expect("height within chain")
    }

    /// Stock collaborators with every feature active.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(self.chain.clone()).features(Arc::new(FluxSchedule::all_active()))
    }
}

/// Default parameters with the rule change at `ec_change_height`.
pub fn params_with_change_at(ec_change_height: u64) -> EcParams {
    EcParams {
        ec_change_height,
        ..EcParams::default()
    }
}
