//! Chain access and the in-memory reference chain.
//!
//! [`Chain`] is the read-only view the Economic Clustering code walks. It is
//! deliberately tiny: a tip, a height, and two lookups. Everything returns
//! `Arc<Block>` so a lookup is a pointer bump, not a deep copy.
//!
//! [`MemoryChain`] is the reference implementation used by the node binary
//! and the tests. Appends are linkage-checked; [`MemoryChain::pop_off_to`]
//! rolls the tip back for reorgs. Popped blocks stay resolvable by id the
//! same way a node's block store keeps orphaned forks around, which is what
//! lets the legacy-era anchor resolution notice a wrong-fork anchor.
//!
//! [`ChainFile`] is the JSON snapshot format the binary reads and writes.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::block::Block;
use crate::config::NETWORK_ID_DEVNET;

// ---------------------------------------------------------------------------
// Chain trait
// ---------------------------------------------------------------------------

/// Read-only access to an append-only chain.
///
/// Implementations guarantee: blocks link through `previous_block_id`,
/// heights are contiguous from genesis = 0, and cumulative difficulty never
/// decreases toward the tip. Callers rely on those facts without
/// re-checking them.
pub trait Chain: Send + Sync {
    /// Current tip, `None` only for an empty chain.
    fn tip(&self) -> Option<Arc<Block>>;

    /// Height of the tip (0 for a genesis-only or empty chain).
    fn height(&self) -> u64;

    /// Canonical block at `height`.
    fn block_at_height(&self, height: u64) -> Option<Arc<Block>>;

    /// Any known block with this id, canonical or not.
    fn block_by_id(&self, id: u64) -> Option<Arc<Block>>;
}

impl<T: Chain + ?Sized> Chain for Arc<T> {
    fn tip(&self) -> Option<Arc<Block>> {
        (**self).tip()
    }

    fn height(&self) -> u64 {
        (**self).height()
    }

    fn block_at_height(&self, height: u64) -> Option<Arc<Block>> {
        (**self).block_at_height(height)
    }

    fn block_by_id(&self, id: u64) -> Option<Arc<Block>> {
        (**self).block_by_id(id)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while extending or loading a chain.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("expected block at height {expected}, got {actual}")]
    HeightMismatch { expected: u64, actual: u64 },

    #[error("block {id} does not extend tip {tip}")]
    ParentMismatch { id: u64, tip: u64 },

    #[error("block {id} lowers cumulative difficulty")]
    DifficultyRegression { id: u64 },

    #[error("block {0} is already on the chain")]
    Duplicate(u64),

    #[error("invalid block: {0}")]
    InvalidBlock(String),

    #[error("chain file contains no genesis block")]
    MissingGenesis,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ChainResult<T> = Result<T, ChainError>;

// ---------------------------------------------------------------------------
// ChainSnapshot
// ---------------------------------------------------------------------------

/// Immutable point-in-time view of a [`MemoryChain`].
///
/// Taking a snapshot clones the index, not the blocks. Handy when a caller
/// wants one consistent view for a whole verification pass while the live
/// chain keeps moving.
#[derive(Debug, Clone, Default)]
pub struct ChainSnapshot {
    canonical: Vec<Arc<Block>>,
    by_id: HashMap<u64, Arc<Block>>,
}

impl ChainSnapshot {
    /// Canonical blocks from genesis to tip.
    pub fn blocks(&self) -> &[Arc<Block>] {
        &self.canonical
    }
}

impl Chain for ChainSnapshot {
    fn tip(&self) -> Option<Arc<Block>> {
        self.canonical.last().cloned()
    }

    fn height(&self) -> u64 {
        self.canonical.last().map_or(0, |b| b.height)
    }

    fn block_at_height(&self, height: u64) -> Option<Arc<Block>> {
        usize::try_from(height)
            .ok()
            .and_then(|h| self.canonical.get(h))
            .cloned()
    }

    fn block_by_id(&self, id: u64) -> Option<Arc<Block>> {
        self.by_id.get(&id).cloned()
    }
}

// ---------------------------------------------------------------------------
// MemoryChain
// ---------------------------------------------------------------------------

/// Thread-safe in-memory chain.
///
/// Readers take a shared lock per lookup; appends and rollbacks take the
/// write lock briefly.
#[derive(Debug)]
pub struct MemoryChain {
    inner: RwLock<ChainSnapshot>,
}

impl MemoryChain {
    /// A chain holding only [`Block::genesis`].
    pub fn new() -> Self {
        Self::with_genesis(Block::genesis())
    }

    /// A chain rooted at a custom genesis block.
    pub fn with_genesis(genesis: Block) -> Self {
        let genesis = Arc::new(genesis);
        let mut by_id = HashMap::new();
        by_id.insert(genesis.id, Arc::clone(&genesis));
        Self {
            inner: RwLock::new(ChainSnapshot {
                canonical: vec![genesis],
                by_id,
            }),
        }
    }

    /// Append `block` on top of the tip.
    ///
    /// # Errors
    ///
    /// Rejects blocks that fail [`Block::verify`], do not sit exactly one
    /// above the tip, do not point at the tip, lower cumulative difficulty,
    /// or are already canonical.
    pub fn append(&self, block: Block) -> ChainResult<Arc<Block>> {
        block.verify().map_err(ChainError::InvalidBlock)?;

        let mut inner = self.inner.write();
        let tip = inner
            .canonical
            .last()
            .cloned()
            .ok_or(ChainError::MissingGenesis)?;

        if inner
            .block_at_height(block.height)
            .is_some_and(|existing| existing.id == block.id)
        {
            return Err(ChainError::Duplicate(block.id));
        }
        if block.height != tip.height + 1 {
            return Err(ChainError::HeightMismatch {
                expected: tip.height + 1,
                actual: block.height,
            });
        }
        if block.previous_block_id != Some(tip.id) {
            return Err(ChainError::ParentMismatch {
                id: block.id,
                tip: tip.id,
            });
        }
        if block.cumulative_difficulty < tip.cumulative_difficulty {
            return Err(ChainError::DifficultyRegression { id: block.id });
        }

        let block = Arc::new(block);
        inner.by_id.insert(block.id, Arc::clone(&block));
        inner.canonical.push(Arc::clone(&block));
        debug!(height = block.height, id = block.id, "block appended");
        Ok(block)
    }

    /// Roll the tip back to `height`, returning the removed blocks tip-first.
    ///
    /// Removed blocks remain resolvable through [`Chain::block_by_id`].
    /// Genesis is never removed.
    pub fn pop_off_to(&self, height: u64) -> Vec<Arc<Block>> {
        let mut inner = self.inner.write();
        let keep = usize::try_from(height)
            .unwrap_or(usize::MAX)
            .saturating_add(1)
            .max(1);
        if keep >= inner.canonical.len() {
            return Vec::new();
        }
        let mut removed = inner.canonical.split_off(keep);
        removed.reverse();
        info!(
            from = height + removed.len() as u64,
            to = height,
            "rolled back chain"
        );
        removed
    }

    /// Consistent point-in-time copy of the chain index.
    pub fn snapshot(&self) -> ChainSnapshot {
        self.inner.read().clone()
    }

    /// Number of canonical blocks, genesis included.
    pub fn len(&self) -> usize {
        self.inner.read().canonical.len()
    }

    /// Always `false`: the chain holds at least genesis.
    pub fn is_empty(&self) -> bool {
        self.inner.read().canonical.is_empty()
    }
}

impl Default for MemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain for MemoryChain {
    fn tip(&self) -> Option<Arc<Block>> {
        self.inner.read().tip()
    }

    fn height(&self) -> u64 {
        self.inner.read().height()
    }

    fn block_at_height(&self, height: u64) -> Option<Arc<Block>> {
        self.inner.read().block_at_height(height)
    }

    fn block_by_id(&self, id: u64) -> Option<Arc<Block>> {
        self.inner.read().block_by_id(id)
    }
}

// ---------------------------------------------------------------------------
// ChainFile
// ---------------------------------------------------------------------------

/// On-disk JSON snapshot of the canonical chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainFile {
    /// Network the chain belongs to.
    pub network_id: u32,
    /// Canonical blocks, genesis first.
    pub blocks: Vec<Block>,
}

impl ChainFile {
    /// Capture the canonical part of `chain`.
    pub fn from_chain(chain: &MemoryChain, network_id: u32) -> Self {
        let blocks = chain
            .snapshot()
            .blocks()
            .iter()
            .map(|b| Block::clone(b))
            .collect();
        Self { network_id, blocks }
    }

    /// Rebuild a [`MemoryChain`], re-running every append check.
    pub fn into_chain(self) -> ChainResult<MemoryChain> {
        let mut blocks = self.blocks.into_iter();
        let genesis = blocks
            .next()
            .filter(|b| b.height == 0)
            .ok_or(ChainError::MissingGenesis)?;
        genesis.verify().map_err(ChainError::InvalidBlock)?;

        let chain = MemoryChain::with_genesis(genesis);
        for block in blocks {
            chain.append(block)?;
        }
        Ok(chain)
    }

    /// Read a snapshot from `path`.
    pub fn load(path: impl AsRef<Path>) -> ChainResult<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the snapshot to `path`, pretty-printed.
    pub fn save(&self, path: impl AsRef<Path>) -> ChainResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

impl Default for ChainFile {
    fn default() -> Self {
        Self {
            network_id: NETWORK_ID_DEVNET,
            blocks: vec![Block::genesis()],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::BurstKeypair;
    use crate::storage::block::BlockBuilder;

    fn grow(chain: &MemoryChain, count: usize, forger: &BurstKeypair) {
        for _ in 0..count {
            let tip = chain.tip().unwrap();
            let mut block = BlockBuilder::new(&tip)
                .generator(forger.public_key())
                .build();
            block.sign(forger);
            chain.append(block).unwrap();
        }
    }

    #[test]
    fn new_chain_holds_genesis() {
        let chain = MemoryChain::new();
        assert_eq!(chain.height(), 0);
        assert_eq!(chain.len(), 1);
        assert!(!chain.is_empty());
        let genesis = chain.block_at_height(0).unwrap();
        assert_eq!(chain.block_by_id(genesis.id).unwrap().id, genesis.id);
    }

    #[test]
    fn append_extends_tip() {
        let chain = MemoryChain::new();
        grow(&chain, 5, &BurstKeypair::generate());
        assert_eq!(chain.height(), 5);
        let tip = chain.tip().unwrap();
        assert_eq!(tip.height, 5);
        assert_eq!(
            tip.previous_block_id,
            Some(chain.block_at_height(4).unwrap().id)
        );
    }

    #[test]
    fn append_rejects_wrong_parent() {
        let chain = MemoryChain::new();
        let forger = BurstKeypair::generate();
        grow(&chain, 2, &forger);

        let stale_parent = chain.block_at_height(1).unwrap();
        let sibling = BlockBuilder::new(&stale_parent).timestamp(999).build();
        let mut orphan_child = BlockBuilder::new(&sibling).build();
        orphan_child.sign(&forger);

        assert!(matches!(
            chain.append(orphan_child),
            Err(ChainError::ParentMismatch { .. })
        ));
    }

    #[test]
    fn append_rejects_height_gap() {
        let chain = MemoryChain::new();
        let genesis = chain.tip().unwrap();
        let one = BlockBuilder::new(&genesis).build();
        let two = BlockBuilder::new(&one).build();
        assert!(matches!(
            chain.append(two),
            Err(ChainError::HeightMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn append_rejects_duplicate() {
        let chain = MemoryChain::new();
        let genesis = chain.tip().unwrap();
        let block = BlockBuilder::new(&genesis).build();
        chain.append(block.clone()).unwrap();
        assert!(matches!(
            chain.append(block),
            Err(ChainError::Duplicate(_))
        ));
    }

    #[test]
    fn append_rejects_difficulty_regression() {
        let chain = MemoryChain::new();
        grow(&chain, 1, &BurstKeypair::generate());
        let tip = chain.tip().unwrap();
        let mut block = BlockBuilder::new(&tip).build();
        block.cumulative_difficulty = num_bigint::BigUint::from(1u8);
        block.id = block.compute_id();
        assert!(matches!(
            chain.append(block),
            Err(ChainError::DifficultyRegression { .. })
        ));
    }

    #[test]
    fn append_rejects_corrupt_block() {
        let chain = MemoryChain::new();
        let mut block = BlockBuilder::new(&chain.tip().unwrap()).build();
        block.id ^= 1;
        assert!(matches!(
            chain.append(block),
            Err(ChainError::InvalidBlock(_))
        ));
    }

    #[test]
    fn pop_off_keeps_orphans_resolvable() {
        let chain = MemoryChain::new();
        grow(&chain, 6, &BurstKeypair::generate());
        let orphaned = chain.block_at_height(5).unwrap();

        let removed = chain.pop_off_to(3);
        assert_eq!(removed.len(), 3);
        assert_eq!(removed[0].height, 6);
        assert_eq!(chain.height(), 3);
        assert!(chain.block_at_height(5).is_none());
        assert_eq!(chain.block_by_id(orphaned.id).unwrap().height, 5);
    }

    #[test]
    fn pop_off_never_removes_genesis() {
        let chain = MemoryChain::new();
        grow(&chain, 2, &BurstKeypair::generate());
        chain.pop_off_to(0);
        assert_eq!(chain.len(), 1);
        assert!(chain.pop_off_to(10).is_empty());
    }

    #[test]
    fn snapshot_is_isolated_from_later_appends() {
        let chain = MemoryChain::new();
        let forger = BurstKeypair::generate();
        grow(&chain, 3, &forger);
        let snapshot = chain.snapshot();
        grow(&chain, 2, &forger);

        assert_eq!(snapshot.height(), 3);
        assert_eq!(chain.height(), 5);
        assert!(snapshot.block_at_height(4).is_none());
    }

    #[test]
    fn arc_chain_delegates() {
        let chain: Arc<dyn Chain> = Arc::new(MemoryChain::new());
        assert_eq!(chain.height(), 0);
        assert!(chain.tip().is_some());
    }

    #[test]
    fn chain_file_roundtrip() {
        let chain = MemoryChain::new();
        grow(&chain, 4, &BurstKeypair::generate());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");

        ChainFile::from_chain(&chain, NETWORK_ID_DEVNET)
            .save(&path)
            .unwrap();
        let restored = ChainFile::load(&path).unwrap().into_chain().unwrap();

        assert_eq!(restored.height(), 4);
        assert_eq!(restored.tip().unwrap().id, chain.tip().unwrap().id);
    }

    #[test]
    fn chain_file_without_genesis_is_rejected() {
        let file = ChainFile {
            network_id: NETWORK_ID_DEVNET,
            blocks: Vec::new(),
        };
        assert!(matches!(
            file.into_chain(),
            Err(ChainError::MissingGenesis)
        ));
    }
}
