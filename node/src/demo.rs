//! Demo chain forging for `burst-node init`.
//!
//! Produces a signed chain with one block every 240 seconds. Each block
//! carries a fee-paying payment anchored a few blocks below it, which gives
//! the Economic Clustering window the economic weight a live chain has.

use std::sync::Arc;

use anyhow::{bail, ensure, Context, Result};

use burst_protocol::config::{NETWORK_ID_DEVNET, NETWORK_ID_MAINNET, NETWORK_ID_TESTNET, ONE_COIN};
use burst_protocol::consensus::{EconomicClustering, FeatureToggle, FluxSchedule};
use burst_protocol::crypto::keys::BurstKeypair;
use burst_protocol::storage::{Block, BlockBuilder, Chain, MemoryChain};
use burst_protocol::transaction::{
    sign_transaction, Transaction, TransactionBuilder, TransactionType,
};

/// Shortest chain `init` will forge. Anything below this leaves no room for
/// a verification window above genesis.
pub const MIN_DEMO_BLOCKS: u64 = 32;

/// Recipient of every demo payment.
const DEMO_RECIPIENT: u64 = 0xB0B;

/// Resolves a network name to its id.
pub fn network_id(name: &str) -> Result<u32> {
    match name.to_lowercase().as_str() {
        "mainnet" => Ok(NETWORK_ID_MAINNET),
        "testnet" => Ok(NETWORK_ID_TESTNET),
        "devnet" => Ok(NETWORK_ID_DEVNET),
        other => bail!("unknown network {other:?} (expected mainnet, testnet or devnet)"),
    }
}

/// Feature schedule for a network. Devnet runs every feature from genesis.
pub fn features_for(network_id: u32) -> Arc<dyn FeatureToggle> {
    if network_id == NETWORK_ID_DEVNET {
        Arc::new(FluxSchedule::all_active())
    } else {
        Arc::new(FluxSchedule::mainnet())
    }
}

/// A signed payment of five coins committed to `anchor`.
pub fn payment(
    sender: &BurstKeypair,
    anchor: &Block,
    timestamp: u32,
    fee_nqt: u64,
) -> Transaction {
    let mut tx = TransactionBuilder::new(TransactionType::Payment, sender.public_key())
        .recipient(DEMO_RECIPIENT)
        .amount_nqt(5 * ONE_COIN)
        .fee_nqt(fee_nqt)
        .timestamp(timestamp)
        .ec_anchor(anchor)
        .build();
    sign_transaction(&mut tx, sender);
    tx
}

/// Forge genesis plus `blocks` signed blocks.
pub fn forge_chain(
    blocks: u64,
    forger: &BurstKeypair,
    payer: &BurstKeypair,
) -> Result<MemoryChain> {
    ensure!(
        blocks >= MIN_DEMO_BLOCKS,
        "a demo chain needs at least {MIN_DEMO_BLOCKS} blocks, got {blocks}"
    );

    let chain = MemoryChain::new();
    for _ in 0..blocks {
        let tip = chain.tip().context("chain lost its genesis block")?;
        let anchor = chain
            .block_at_height(tip.height.saturating_sub(9))
            .context("anchor height below the tip is missing")?;
        let fee_tx = payment(payer, &anchor, tip.timestamp, ONE_COIN);

        let mut block = BlockBuilder::new(&tip)
            .generator(forger.public_key())
            .transactions(vec![fee_tx])
            .build();
        block.sign(forger);
        chain.append(block)?;
    }

    tracing::info!(height = chain.height(), "demo chain forged");
    Ok(chain)
}

/// Two sample transactions at the tip's timestamp: one anchored on the
/// selected EC block and one anchored on a block from a rival fork.
pub fn sample_transactions(
    chain: &MemoryChain,
    ec: &EconomicClustering,
    sender: &BurstKeypair,
) -> Result<(Transaction, Transaction)> {
    let tip = chain.tip().context("chain is empty")?;
    let anchor = ec.select_anchor(tip.timestamp)?;
    let honest = payment(sender, &anchor, tip.timestamp, ONE_COIN / 10);

    // Same height as the anchor, different history.
    let parent = chain
        .block_at_height(anchor.height.saturating_sub(1))
        .context("anchor parent is missing")?;
    let rival_forger = BurstKeypair::generate();
    let mut rival = BlockBuilder::new(&parent)
        .timestamp(parent.timestamp + 200)
        .generator(rival_forger.public_key())
        .build();
    rival.sign(&rival_forger);
    let forked = payment(sender, &rival, tip.timestamp, ONE_COIN / 10);

    Ok((honest, forked))
}
