//! Fork verification of a transaction's EC anchor.
//!
//! A transaction names the block it was created against. Before accepting
//! it, a node checks that the named block is on its own canonical chain and
//! that the stretch of chain beneath it is heavy, signed, and internally
//! consistent. A transaction minted on a cheap private fork fails here.
//!
//! ```text
//!   tip ── … ── anchor ── b-1 ── b-2 ── … ── b-depth
//!                 │◄──────── verification window ───────►│
//! ```
//!
//! [`ForkVerifier::verify`] runs on peer input and only ever answers yes or
//! no. The reason for a rejection goes to the log, never to the caller.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::Zero;
use thiserror::Error;
use tracing::{debug, error, trace, warn};

use super::authenticator::{BlockAuthenticator, TransactionAuthenticator};
use super::flux::{AverageBlockInterval, Feature, FeatureToggle};
use super::{Collaborators, Era};
use crate::config::EcParams;
use crate::crypto::ct_eq_u64;
use crate::storage::{Block, Chain};
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// Rejection reasons
// ---------------------------------------------------------------------------

/// Why a transaction's anchor was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForkRejection {
    #[error("chain has no blocks")]
    EmptyChain,

    #[error("timestamp {timestamp} lags tip timestamp {tip_timestamp} by more than {max_drift}s")]
    StaleTimestamp {
        timestamp: u32,
        tip_timestamp: u32,
        max_drift: u64,
    },

    #[error("anchor block is unknown")]
    AnchorNotFound,

    #[error("anchor block is not on the canonical chain")]
    WrongFork,

    #[error("anchor height {anchor_height} is too far from current height {current_height}")]
    AnchorTooFar {
        anchor_height: u64,
        current_height: u64,
    },

    #[error("verification window below height {height} reaches past genesis")]
    WindowTooShort { height: u64 },

    #[error("predecessor {0} of a visited block is missing")]
    MissingPredecessor(u64),

    #[error("invalid generator signature at height {height}")]
    BadBlockSignature { height: u64 },

    #[error("cumulative difficulty does not increase at height {height}")]
    NonIncreasingDifficulty { height: u64 },

    #[error("fork strength does not exceed the main chain at depth {depth}")]
    WeakFork { depth: usize },

    #[error("duplicate transaction {tx} at height {height}")]
    DuplicateTransaction { height: u64, tx: u64 },

    #[error("transaction {tx} at height {height} failed sender key verification")]
    BadSenderKey { height: u64, tx: u64 },

    #[error("transaction {tx} at height {height} anchors too far from its block")]
    LegacyAnchorDistance { height: u64, tx: u64 },

    #[error("block at height {height} has an implausible timestamp")]
    AncestorTimestamp { height: u64 },

    #[error("anchor height does not match the claimed height")]
    HeightMismatch,
}

impl ForkRejection {
    /// `true` when the rejection points at a broken chain rather than a bad
    /// transaction.
    pub fn is_chain_fault(&self) -> bool {
        matches!(self, Self::EmptyChain | Self::MissingPredecessor(_))
    }
}

// ---------------------------------------------------------------------------
// ForkVerifier
// ---------------------------------------------------------------------------

/// Accept/reject decision for a transaction's claimed EC anchor.
///
/// Stateless between calls; safe to share across validation threads.
pub struct ForkVerifier {
    chain: Arc<dyn Chain>,
    blocks: Arc<dyn BlockAuthenticator>,
    transactions: Arc<dyn TransactionAuthenticator>,
    features: Arc<dyn FeatureToggle>,
    block_time: Arc<dyn AverageBlockInterval>,
    params: EcParams,
}

impl ForkVerifier {
    pub fn new(collaborators: Collaborators, params: EcParams) -> Self {
        Self {
            chain: collaborators.chain,
            blocks: collaborators.block_authenticator,
            transactions: collaborators.transaction_authenticator,
            features: collaborators.features,
            block_time: collaborators.block_time,
            params,
        }
    }

    /// `true` if `tx`'s anchor is acceptable against the current chain.
    ///
    /// Never panics: a panic inside a collaborator is caught, logged, and
    /// reported as a rejection.
    pub fn verify(&self, tx: &Transaction) -> bool {
        match panic::catch_unwind(AssertUnwindSafe(|| self.check(tx))) {
            Ok(Ok(())) => {
                trace!(tx = tx.id, "EC anchor accepted");
                true
            }
            Ok(Err(reason)) if reason.is_chain_fault() => {
                error!(tx = tx.id, %reason, "fork verification hit a chain fault");
                false
            }
            Ok(Err(reason)) => {
                warn!(tx = tx.id, %reason, "transaction failed fork verification");
                false
            }
            Err(_) => {
                error!(tx = tx.id, "fork verification panicked");
                false
            }
        }
    }

    /// Full verification with the rejection reason.
    ///
    /// For diagnostics and tests. Anything facing peers should call
    /// [`verify`](Self::verify) instead.
    pub fn check(&self, tx: &Transaction) -> Result<(), ForkRejection> {
        let current_height = self.chain.height();

        if !self
            .features
            .is_active(Feature::EconomicClustering, current_height)
        {
            trace!(current_height, "economic clustering inactive");
            return Ok(());
        }

        let tip = self.chain.tip().ok_or(ForkRejection::EmptyChain)?;
        let max_drift = self.block_time.at(current_height).as_secs();
        let drift_floor = i64::from(tip.timestamp) - i64::try_from(max_drift).unwrap_or(i64::MAX);
        if i64::from(tx.timestamp) < drift_floor {
            return Err(ForkRejection::StaleTimestamp {
                timestamp: tx.timestamp,
                tip_timestamp: tip.timestamp,
                max_drift,
            });
        }

        let era = Era::at(current_height, &self.params);
        let anchor = self.resolve_anchor(tx, era)?;

        if era == Era::Legacy
            && current_height.abs_diff(tx.ec_block_height) > self.params.ec_block_distance_limit
        {
            return Err(ForkRejection::AnchorTooFar {
                anchor_height: tx.ec_block_height,
                current_height,
            });
        }

        self.walk_window(&anchor, &tip)?;

        if !ct_eq_u64(anchor.height, tx.ec_block_height) {
            return Err(ForkRejection::HeightMismatch);
        }
        Ok(())
    }

    /// Find the anchor and make sure it is the canonical block.
    ///
    /// Legacy era looks the anchor up by id and then confirms the canonical
    /// block at that height is the same block. Modern era goes straight to
    /// the canonical block at the claimed height and compares ids.
    fn resolve_anchor(&self, tx: &Transaction, era: Era) -> Result<Arc<Block>, ForkRejection> {
        match era {
            Era::Legacy => {
                let anchor = self
                    .chain
                    .block_by_id(tx.ec_block_id)
                    .ok_or(ForkRejection::AnchorNotFound)?;
                let canonical = self
                    .chain
                    .block_at_height(anchor.height)
                    .ok_or(ForkRejection::WrongFork)?;
                if !ct_eq_u64(canonical.id, anchor.id) {
                    return Err(ForkRejection::WrongFork);
                }
                Ok(anchor)
            }
            Era::Modern => {
                let anchor = self
                    .chain
                    .block_at_height(tx.ec_block_height)
                    .ok_or(ForkRejection::AnchorNotFound)?;
                if !ct_eq_u64(anchor.id, tx.ec_block_id) {
                    return Err(ForkRejection::WrongFork);
                }
                Ok(anchor)
            }
        }
    }

    /// Walk `ec_verification_depth` blocks down from the anchor.
    fn walk_window(&self, anchor: &Arc<Block>, tip: &Block) -> Result<(), ForkRejection> {
        let mut current = Arc::clone(anchor);
        let mut difficulty_sum = BigUint::zero();
        let mut weight_sum = BigUint::zero();

        for depth in 0..self.params.ec_verification_depth {
            debug!(
                depth,
                height = current.height,
                id = current.id,
                "verifying window block"
            );
            let previous_id = current
                .previous_block_id
                .ok_or(ForkRejection::WindowTooShort {
                    height: current.height,
                })?;
            let previous = self
                .chain
                .block_by_id(previous_id)
                .ok_or(ForkRejection::MissingPredecessor(previous_id))?;

            if !self.blocks.verify_signature(&current) {
                return Err(ForkRejection::BadBlockSignature {
                    height: current.height,
                });
            }

            if current.cumulative_difficulty <= previous.cumulative_difficulty {
                return Err(ForkRejection::NonIncreasingDifficulty {
                    height: current.height,
                });
            }

            difficulty_sum += &current.cumulative_difficulty - &previous.cumulative_difficulty;
            weight_sum += self.blocks.economic_weight(&current);
            let fork_strength = &difficulty_sum * &weight_sum;
            let baseline = &previous.cumulative_difficulty * BigUint::from(depth + 1);
            if fork_strength <= baseline {
                debug!(depth, %fork_strength, %baseline, "fork too weak");
                return Err(ForkRejection::WeakFork { depth });
            }

            self.check_block_transactions(&current)?;

            if current.timestamp >= tip.timestamp
                || tip.timestamp - current.timestamp > self.params.max_ancestor_age
            {
                return Err(ForkRejection::AncestorTimestamp {
                    height: current.height,
                });
            }

            current = previous;
        }
        Ok(())
    }

    /// Per-transaction checks for one visited block.
    fn check_block_transactions(&self, block: &Block) -> Result<(), ForkRejection> {
        let legacy = Era::at(block.height, &self.params) == Era::Legacy;
        let mut seen = HashSet::with_capacity(block.transactions.len());

        for tx in &block.transactions {
            if !seen.insert(tx.id) {
                return Err(ForkRejection::DuplicateTransaction {
                    height: block.height,
                    tx: tx.id,
                });
            }
            if !self.transactions.verify_sender_key(tx) {
                return Err(ForkRejection::BadSenderKey {
                    height: block.height,
                    tx: tx.id,
                });
            }
            if legacy
                && block.height.abs_diff(tx.ec_block_height) > self.params.ec_block_distance_limit
            {
                return Err(ForkRejection::LegacyAnchorDistance {
                    height: block.height,
                    tx: tx.id,
                });
            }
        }
        Ok(())
    }

    pub fn params(&self) -> &EcParams {
        &self.params
    }
}
