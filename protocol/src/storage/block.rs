//! # Block Structure
//!
//! A block is the atomic unit of the chain: an ordered list of transactions,
//! a link to its predecessor, the accumulated chain weight, and the
//! generator's signature.
//!
//! ## Block Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  id: u64                (derived, see below) │
//! │  version: u32                                │
//! │  height: u64                                 │
//! │  timestamp: u32         (chain epoch secs)   │
//! │  previous_block_id: Option<u64>              │
//! │  cumulative_difficulty: BigUint              │
//! │  base_target: u64                            │
//! │  total_amount_nqt / total_fee_nqt: u64       │
//! │  generator_public_key: [u8; 32]              │
//! │  block_signature: Option<[u8; 64]>           │
//! ├──────────────────────────────────────────────┤
//! │  transactions: Vec<Transaction>              │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//!
//! The generator signs [`Block::signable_bytes`]. The block id is the first
//! 8 bytes (LE) of SHA-256 over the signable bytes followed by the signature,
//! so a re-signed block gets a new id. The payload digest inside the signable
//! bytes commits to every transaction, signature included.
//!
//! ## Difficulty
//!
//! Each block adds `2^64 / base_target` to its parent's cumulative
//! difficulty. Lower base target means harder forging means more weight.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::config::{BLOCK_VERSION, INITIAL_BASE_TARGET};
use crate::crypto::hash::{id_of, sha256_array};
use crate::crypto::keys::{BurstKeypair, BurstPublicKey, BurstSignature};
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A full block: header fields plus the ordered transaction list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Derived id, see the module docs.
    pub id: u64,
    /// Block format version.
    pub version: u32,
    /// Height above genesis (genesis = 0).
    pub height: u64,
    /// Forging time, seconds since the chain epoch.
    pub timestamp: u32,
    /// Id of the predecessor. `None` only for genesis.
    pub previous_block_id: Option<u64>,
    /// Total chain weight up to and including this block.
    #[serde(with = "biguint_decimal")]
    pub cumulative_difficulty: BigUint,
    /// Forging target this block was produced under.
    pub base_target: u64,
    /// Sum of `amount_nqt` over the block's transactions.
    pub total_amount_nqt: u64,
    /// Sum of `fee_nqt` over the block's transactions.
    pub total_fee_nqt: u64,
    /// Public key of the forger.
    pub generator_public_key: BurstPublicKey,
    /// Transactions in inclusion order.
    pub transactions: Vec<Transaction>,
    /// Generator signature over [`Block::signable_bytes`].
    pub block_signature: Option<BurstSignature>,
}

impl Block {
    /// Construct the genesis block.
    ///
    /// Height 0, timestamp 0, zero cumulative difficulty, no transactions,
    /// an all-zero generator key and no signature.
    pub fn genesis() -> Self {
        let mut genesis = Block {
            id: 0,
            version: BLOCK_VERSION,
            height: 0,
            timestamp: 0,
            previous_block_id: None,
            cumulative_difficulty: BigUint::zero(),
            base_target: INITIAL_BASE_TARGET,
            total_amount_nqt: 0,
            total_fee_nqt: 0,
            generator_public_key: BurstPublicKey::from_bytes([0u8; 32]),
            transactions: Vec::new(),
            block_signature: None,
        };
        genesis.id = genesis.compute_id();
        genesis
    }

    /// Canonical bytes covered by the generator signature.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let difficulty = self.cumulative_difficulty.to_bytes_le();
        let mut buf = Vec::with_capacity(160 + difficulty.len());
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.height.to_le_bytes());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        buf.extend_from_slice(&self.previous_block_id.unwrap_or(0).to_le_bytes());
        buf.extend_from_slice(&(difficulty.len() as u32).to_le_bytes());
        buf.extend_from_slice(&difficulty);
        buf.extend_from_slice(&self.base_target.to_le_bytes());
        buf.extend_from_slice(&self.total_amount_nqt.to_le_bytes());
        buf.extend_from_slice(&self.total_fee_nqt.to_le_bytes());
        buf.extend_from_slice(&(self.transactions.len() as u32).to_le_bytes());
        buf.extend_from_slice(&payload_hash(&self.transactions));
        buf.extend_from_slice(self.generator_public_key.as_bytes());
        buf
    }

    /// Recompute the id from the current contents and signature.
    pub fn compute_id(&self) -> u64 {
        let mut bytes = self.signable_bytes();
        if let Some(signature) = &self.block_signature {
            bytes.extend_from_slice(signature.as_bytes());
        }
        id_of(&bytes)
    }

    /// Sign the block with the generator's keypair and refresh its id.
    ///
    /// The keypair should match `generator_public_key`; otherwise
    /// [`verify_signature`](Self::verify_signature) will fail later.
    pub fn sign(&mut self, keypair: &BurstKeypair) {
        self.block_signature = Some(keypair.sign(&self.signable_bytes()));
        self.id = self.compute_id();
    }

    /// `true` if the block carries a signature that verifies against its
    /// generator key. Genesis is unsigned and therefore `false`.
    pub fn verify_signature(&self) -> bool {
        match &self.block_signature {
            Some(signature) => self
                .generator_public_key
                .verify(&self.signable_bytes(), signature),
            None => false,
        }
    }

    /// Verify block integrity: id, totals and genesis linkage rules.
    ///
    /// Does NOT check the signature; see [`verify_signature`](Self::verify_signature).
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string on any mismatch.
    pub fn verify(&self) -> Result<(), String> {
        let expected_id = self.compute_id();
        if self.id != expected_id {
            return Err(format!(
                "block {} id mismatch: stored={}, computed={}",
                self.height, self.id, expected_id
            ));
        }

        let (amount, fee) = totals(&self.transactions);
        if self.total_amount_nqt != amount || self.total_fee_nqt != fee {
            return Err(format!(
                "block {} totals mismatch: stored=({}, {}), computed=({}, {})",
                self.height, self.total_amount_nqt, self.total_fee_nqt, amount, fee
            ));
        }

        match (self.height, self.previous_block_id) {
            (0, Some(_)) => Err("genesis block must not have a predecessor".to_string()),
            (h, None) if h > 0 => Err(format!("block {} has no predecessor", h)),
            _ => Ok(()),
        }
    }

    /// Return the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Unsigned decimal rendering of the id.
    pub fn string_id(&self) -> String {
        self.id.to_string()
    }
}

// ---------------------------------------------------------------------------
// BlockBuilder
// ---------------------------------------------------------------------------

/// Forges an unsigned child block on top of a parent.
///
/// Height, predecessor link, cumulative difficulty and totals are derived;
/// the caller picks timestamp, base target, generator and transactions.
///
/// ```
/// use burst_protocol::crypto::keys::BurstKeypair;
/// use burst_protocol::storage::{Block, BlockBuilder};
///
/// let forger = BurstKeypair::generate();
/// let genesis = Block::genesis();
/// let mut child = BlockBuilder::new(&genesis)
///     .timestamp(240)
///     .generator(forger.public_key())
///     .build();
/// child.sign(&forger);
/// assert!(child.verify_signature());
/// ```
pub struct BlockBuilder<'a> {
    parent: &'a Block,
    timestamp: u32,
    base_target: u64,
    generator: BurstPublicKey,
    transactions: Vec<Transaction>,
}

impl<'a> BlockBuilder<'a> {
    /// Start a child of `parent`. Defaults: parent's base target, timestamp
    /// one block time after the parent, all-zero generator.
    pub fn new(parent: &'a Block) -> Self {
        Self {
            parent,
            timestamp: parent
                .timestamp
                .saturating_add(crate::config::BLOCK_TIME_SECS),
            base_target: parent.base_target,
            generator: BurstPublicKey::from_bytes([0u8; 32]),
            transactions: Vec::new(),
        }
    }

    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Base target for this block. Zero is clamped to one.
    pub fn base_target(mut self, base_target: u64) -> Self {
        self.base_target = base_target.max(1);
        self
    }

    pub fn generator(mut self, generator: BurstPublicKey) -> Self {
        self.generator = generator;
        self
    }

    pub fn transactions(mut self, transactions: Vec<Transaction>) -> Self {
        self.transactions = transactions;
        self
    }

    /// Produce the unsigned block with its id computed.
    pub fn build(self) -> Block {
        let (total_amount_nqt, total_fee_nqt) = totals(&self.transactions);
        let cumulative_difficulty = &self.parent.cumulative_difficulty
            + difficulty_increment(self.base_target);

        let mut block = Block {
            id: 0,
            version: BLOCK_VERSION,
            height: self.parent.height + 1,
            timestamp: self.timestamp,
            previous_block_id: Some(self.parent.id),
            cumulative_difficulty,
            base_target: self.base_target,
            total_amount_nqt,
            total_fee_nqt,
            generator_public_key: self.generator,
            transactions: self.transactions,
            block_signature: None,
        };
        block.id = block.compute_id();
        block
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Weight a block adds to the chain: `2^64 / base_target`.
pub fn difficulty_increment(base_target: u64) -> BigUint {
    (BigUint::one() << 64u32) / BigUint::from(base_target.max(1))
}

/// Saturating sums of amounts and fees.
fn totals(transactions: &[Transaction]) -> (u64, u64) {
    transactions.iter().fold((0u64, 0u64), |(amount, fee), tx| {
        (
            amount.saturating_add(tx.amount_nqt),
            fee.saturating_add(tx.fee_nqt),
        )
    })
}

/// SHA-256 over every transaction's signable bytes and signature.
fn payload_hash(transactions: &[Transaction]) -> [u8; 32] {
    let mut payload = Vec::with_capacity(transactions.len() * 200);
    for tx in transactions {
        payload.extend_from_slice(&tx.signable_bytes());
        if let Some(signature) = &tx.signature {
            payload.extend_from_slice(signature.as_bytes());
        }
    }
    sha256_array(&payload)
}

/// Cumulative difficulty as a decimal string. JSON numbers lose precision
/// past 2^53 in most consumers, and the value outgrows u64 quickly anyway.
mod biguint_decimal {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(deserializer)?;
        BigUint::parse_bytes(s.as_bytes(), 10)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid cumulative difficulty: {s}")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
