//! EC anchor selection.
//!
//! A new transaction commits to a recent block (its "anchor") by id and
//! height. The anchor is found by walking back from the tip until a block is
//! old enough relative to the transaction timestamp, or until the walk hits
//! the distance cap. Every node runs the same walk over the same chain and
//! lands on the same block.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::config::EcParams;
use crate::storage::{Block, Chain};

/// Errors from [`AnchorSelector::select_anchor`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EcError {
    /// The requested timestamp lags the tip by more than the allowed drift.
    #[error(
        "timestamp {timestamp} is more than {max_difference}s earlier than tip timestamp {tip_timestamp}"
    )]
    InvalidTimestamp {
        timestamp: u32,
        tip_timestamp: u32,
        max_difference: u32,
    },

    /// The chain has no blocks at all.
    #[error("chain has no blocks")]
    EmptyChain,

    /// A block links to a predecessor the chain cannot produce.
    #[error("block {0} is referenced but not stored")]
    MissingBlock(u64),
}

/// Picks the EC anchor for a transaction timestamp.
pub struct AnchorSelector {
    chain: Arc<dyn Chain>,
    params: EcParams,
}

impl AnchorSelector {
    pub fn new(chain: Arc<dyn Chain>, params: EcParams) -> Self {
        Self { chain, params }
    }

    /// Anchor block for a transaction stamped `timestamp`.
    ///
    /// Walks back from the tip while the block is newer than
    /// `timestamp - ec_rule_terminator` and fewer than
    /// `ec_block_distance_limit` steps have been taken. Genesis ends the walk.
    ///
    /// # Errors
    ///
    /// [`EcError::InvalidTimestamp`] if `timestamp` is more than
    /// `max_timestamp_difference` seconds before the tip,
    /// [`EcError::EmptyChain`] without a tip, and
    /// [`EcError::MissingBlock`] when a predecessor link dangles.
    pub fn select_anchor(&self, timestamp: u32) -> Result<Arc<Block>, EcError> {
        let mut block = self.chain.tip().ok_or(EcError::EmptyChain)?;

        let timestamp_i = i64::from(timestamp);
        if timestamp_i
            < i64::from(block.timestamp) - i64::from(self.params.max_timestamp_difference)
        {
            return Err(EcError::InvalidTimestamp {
                timestamp,
                tip_timestamp: block.timestamp,
                max_difference: self.params.max_timestamp_difference,
            });
        }

        let horizon = timestamp_i - i64::from(self.params.ec_rule_terminator);
        let mut distance: u64 = 0;
        while i64::from(block.timestamp) > horizon
            && distance < self.params.ec_block_distance_limit
        {
            let Some(previous_id) = block.previous_block_id else {
                break;
            };
            block = self
                .chain
                .block_by_id(previous_id)
                .ok_or(EcError::MissingBlock(previous_id))?;
            distance += 1;
        }

        debug!(
            timestamp,
            anchor_height = block.height,
            anchor_id = block.id,
            distance,
            "selected EC anchor"
        );
        Ok(block)
    }

    pub fn params(&self) -> &EcParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BLOCK_TIME_SECS;
    use crate::storage::{BlockBuilder, ChainSnapshot, MemoryChain};

    /// Chain of `len` blocks after genesis, `spacing` seconds apart.
    fn spaced_chain(len: u64, spacing: u32) -> Arc<MemoryChain> {
        let chain = Arc::new(MemoryChain::new());
        for _ in 0..len {
            let tip = chain.tip().unwrap();
            let block = BlockBuilder::new(&tip)
                .timestamp(tip.timestamp + spacing)
                .build();
            chain.append(block).unwrap();
        }
        chain
    }

    fn chain_of(len: u64) -> Arc<MemoryChain> {
        spaced_chain(len, BLOCK_TIME_SECS)
    }

    fn selector(chain: Arc<MemoryChain>) -> AnchorSelector {
        AnchorSelector::new(chain, EcParams::default())
    }

    #[test]
    fn anchor_is_older_than_terminator() {
        let chain = chain_of(100);
        let tip = chain.tip().unwrap();
        let anchor = selector(chain).select_anchor(tip.timestamp).unwrap();

        // 2400s horizon at 240s per block: ten blocks back.
        assert_eq!(anchor.height, 90);
        assert!(i64::from(anchor.timestamp) <= i64::from(tip.timestamp) - 2_400);
    }

    #[test]
    fn anchor_is_deterministic() {
        let chain = chain_of(50);
        let ts = chain.tip().unwrap().timestamp + 30;
        let s = selector(chain);
        assert_eq!(s.select_anchor(ts).unwrap().id, s.select_anchor(ts).unwrap().id);
    }

    #[test]
    fn later_timestamps_never_move_anchor_back() {
        let chain = chain_of(120);
        let s = selector(chain.clone());
        let base = chain.tip().unwrap().timestamp;
        let mut last = 0;
        for offset in (0..2_000).step_by(37) {
            let height = s.select_anchor(base + offset).unwrap().height;
            assert!(height >= last);
            last = height;
        }
    }

    #[test]
    fn walk_stops_at_distance_limit() {
        // Ten-second blocks: the last 60 all sit inside the time horizon,
        // so only the cap stops the walk.
        let chain = spaced_chain(200, 10);
        let tip = chain.tip().unwrap();
        let anchor = selector(chain).select_anchor(tip.timestamp).unwrap();
        assert_eq!(anchor.height, 200 - 60);
    }

    #[test]
    fn short_chain_stops_at_genesis() {
        let chain = chain_of(3);
        let tip = chain.tip().unwrap();
        let anchor = selector(chain).select_anchor(tip.timestamp).unwrap();
        assert_eq!(anchor.height, 0);
        assert!(anchor.previous_block_id.is_none());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let chain = chain_of(10);
        let tip = chain.tip().unwrap();
        let err = selector(chain)
            .select_anchor(tip.timestamp - 16)
            .unwrap_err();
        assert!(matches!(err, EcError::InvalidTimestamp { max_difference: 15, .. }));
    }

    #[test]
    fn timestamp_at_drift_edge_is_accepted() {
        let chain = chain_of(10);
        let tip = chain.tip().unwrap();
        assert!(selector(chain).select_anchor(tip.timestamp - 15).is_ok());
    }

    #[test]
    fn small_timestamps_do_not_underflow() {
        let chain = chain_of(0);
        let anchor = selector(chain).select_anchor(0).unwrap();
        assert_eq!(anchor.height, 0);
    }

    #[test]
    fn empty_chain_is_an_error() {
        let s = AnchorSelector::new(Arc::new(ChainSnapshot::default()), EcParams::default());
        assert_eq!(s.select_anchor(0).unwrap_err(), EcError::EmptyChain);
    }
}
