//! Priority-ordered pool of unconfirmed transactions.
//!
//! Thread-safe pool for transactions received from peers and awaiting block
//! inclusion. Transactions are indexed by id for O(1) lookups, and sorted by
//! fee-per-byte in a B-tree for forging selection. Per-sender tracking keeps
//! any single account from monopolizing pool capacity.
//!
//! ## Admission
//!
//! Cheap checks first, the chain walk last:
//!
//! 1. duplicate id
//! 2. deadline already passed
//! 3. minimum fee
//! 4. structural and signature validity
//! 5. EC anchor, through a shared [`ForkVerifier`]
//! 6. per-sender limit
//! 7. capacity, with eviction of the cheapest entry
//!
//! An EC failure surfaces as the single opaque
//! [`MempoolError::EconomicClusteringRejected`]; the detailed reason stays in
//! the verifier's log.
//!
//! ## Design
//!
//! - `DashMap` provides lock-free concurrent reads for the hot path
//!   (duplicate detection while relaying).
//! - `parking_lot::RwLock<BTreeMap>` protects the fee index. Writers are rare
//!   (new transactions, evictions) compared to readers (forgers scanning the
//!   top-N entries).
//! - Every insert and removal holds the fee index write lock, so the id map,
//!   the fee index and the per-sender counts change together. The slow checks
//!   (signature, EC walk) run before the lock is taken.
//! - Time is chain time. Callers pass the tip timestamp; the pool never reads
//!   the wall clock.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};

use crate::consensus::ForkVerifier;
use crate::transaction::{verify_transaction, Transaction, TransactionError};

type SenderKey = [u8; 32];

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunable parameters for pool behaviour.
///
/// Defaults suit a devnet where fee enforcement is relaxed. Public nodes
/// should raise `min_fee_nqt` and lower `max_per_sender` to resist spam.
#[derive(Debug, Clone)]
pub struct MempoolConfig {
    /// Maximum number of transactions the pool will hold.
    pub max_size: usize,

    /// Maximum pending transactions allowed per sender key.
    pub max_per_sender: usize,

    /// Minimum acceptable fee in NQT.
    pub min_fee_nqt: u64,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_size: 8_192,
            max_per_sender: 100,
            min_fee_nqt: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// FeeKey — B-tree ordering key
// ---------------------------------------------------------------------------

/// Composite key for the fee-priority index.
///
/// Sorted by fee-per-byte descending. Ties go to the earlier arrival, then
/// to the lower id so that keys are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FeeKey {
    /// `u64::MAX - fee_per_byte`, so ascending order is highest fee first.
    inverted_fee: u64,

    /// Chain time at which the entry was admitted.
    added_at: u32,

    tx_id: u64,
}

impl Ord for FeeKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.inverted_fee
            .cmp(&other.inverted_fee)
            .then_with(|| self.added_at.cmp(&other.added_at))
            .then_with(|| self.tx_id.cmp(&other.tx_id))
    }
}

impl PartialOrd for FeeKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// MempoolEntry
// ---------------------------------------------------------------------------

/// A transaction together with pool-management metadata.
#[derive(Debug, Clone)]
pub struct MempoolEntry {
    pub transaction: Transaction,

    /// Chain time at which the transaction was admitted.
    pub added_at: u32,

    /// Pre-computed fee density used for priority ordering.
    pub fee_per_byte: u64,
}

impl MempoolEntry {
    fn fee_key(&self) -> FeeKey {
        FeeKey {
            inverted_fee: u64::MAX - self.fee_per_byte,
            added_at: self.added_at,
            tx_id: self.transaction.id,
        }
    }
}

/// Fee in NQT per signed byte.
fn fee_per_byte(tx: &Transaction) -> u64 {
    let size = tx.signable_bytes().len() as u64 + 64;
    tx.fee_nqt / size.max(1)
}

// ---------------------------------------------------------------------------
// MempoolError
// ---------------------------------------------------------------------------

/// Errors returned by pool operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MempoolError {
    #[error("transaction already exists in the pool")]
    DuplicateTransaction,

    #[error("transaction expired at {expiration}, chain time is {now}")]
    Expired { expiration: u32, now: u32 },

    #[error("fee too low: minimum {min}, got {got}")]
    FeeTooLow { min: u64, got: u64 },

    #[error("invalid transaction: {0}")]
    Invalid(#[from] TransactionError),

    #[error("transaction rejected by economic clustering")]
    EconomicClusteringRejected,

    #[error("sender {sender} exceeded per-sender limit of {limit}")]
    SenderLimitExceeded { sender: String, limit: usize },

    #[error("pool is full ({size} transactions)")]
    MempoolFull { size: usize },
}

// ---------------------------------------------------------------------------
// Mempool
// ---------------------------------------------------------------------------

/// A thread-safe unconfirmed transaction pool.
pub struct Mempool {
    /// Pending transactions indexed by id.
    transactions: DashMap<u64, MempoolEntry>,

    /// Ids ordered by fee density, highest first.
    fee_index: RwLock<BTreeMap<FeeKey, u64>>,

    /// Per-sender transaction count for rate limiting.
    sender_counts: DashMap<SenderKey, usize>,

    /// EC admission check. `None` admits every anchor.
    verifier: Option<Arc<ForkVerifier>>,

    config: MempoolConfig,
}

impl fmt::Debug for Mempool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mempool")
            .field("size", &self.transactions.len())
            .field("economic_clustering", &self.verifier.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl Mempool {
    /// Pool without an EC check.
    pub fn new(config: MempoolConfig) -> Self {
        Self {
            transactions: DashMap::new(),
            fee_index: RwLock::new(BTreeMap::new()),
            sender_counts: DashMap::new(),
            verifier: None,
            config,
        }
    }

    /// Pool that admits only transactions whose EC anchor verifies.
    pub fn with_verifier(config: MempoolConfig, verifier: Arc<ForkVerifier>) -> Self {
        Self {
            verifier: Some(verifier),
            ..Self::new(config)
        }
    }

    /// Admit `tx` at chain time `now` (usually the tip timestamp).
    ///
    /// See the module docs for the order of checks.
    pub fn add(&self, tx: Transaction, now: u32) -> Result<(), MempoolError> {
        if self.transactions.contains_key(&tx.id) {
            return Err(MempoolError::DuplicateTransaction);
        }

        if tx.expiration() < now {
            return Err(MempoolError::Expired {
                expiration: tx.expiration(),
                now,
            });
        }

        if tx.fee_nqt < self.config.min_fee_nqt {
            return Err(MempoolError::FeeTooLow {
                min: self.config.min_fee_nqt,
                got: tx.fee_nqt,
            });
        }

        verify_transaction(&tx)?;

        if let Some(verifier) = &self.verifier {
            if !verifier.verify(&tx) {
                return Err(MempoolError::EconomicClusteringRejected);
            }
        }

        let sender = *tx.sender_public_key.as_bytes();
        let fee_per_byte = fee_per_byte(&tx);

        // Admission is serialized on the fee index. Lock order is always
        // fee index, then the DashMap shards.
        let mut index = self.fee_index.write();

        if self.transactions.contains_key(&tx.id) {
            return Err(MempoolError::DuplicateTransaction);
        }

        let sender_count = self.sender_counts.get(&sender).map_or(0, |v| *v);
        if sender_count >= self.config.max_per_sender {
            return Err(MempoolError::SenderLimitExceeded {
                sender: tx.sender_public_key.to_hex(),
                limit: self.config.max_per_sender,
            });
        }

        if self.transactions.len() >= self.config.max_size
            && !self.evict_lowest(&mut index, fee_per_byte)
        {
            return Err(MempoolError::MempoolFull {
                size: self.config.max_size,
            });
        }

        let tx_id = tx.id;
        let entry = MempoolEntry {
            transaction: tx,
            added_at: now,
            fee_per_byte,
        };
        let fee_key = entry.fee_key();

        match self.transactions.entry(tx_id) {
            Entry::Occupied(_) => return Err(MempoolError::DuplicateTransaction),
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }
        index.insert(fee_key, tx_id);
        *self.sender_counts.entry(sender).or_insert(0) += 1;
        drop(index);

        debug!(tx = tx_id, fee_per_byte, "transaction admitted");
        Ok(())
    }

    /// Removes a transaction by id and returns it.
    pub fn remove(&self, tx_id: u64) -> Option<Transaction> {
        let mut index = self.fee_index.write();
        let (_, entry) = self.transactions.remove(&tx_id)?;
        index.remove(&entry.fee_key());
        self.decrement_sender_count(entry.transaction.sender_public_key.as_bytes());
        Some(entry.transaction)
    }

    /// Drops transactions that made it into a block. Missing ids are ignored.
    pub fn remove_batch(&self, tx_ids: &[u64]) {
        for &id in tx_ids {
            self.remove(id);
        }
    }

    pub fn get(&self, tx_id: u64) -> Option<Transaction> {
        self.transactions.get(&tx_id).map(|e| e.transaction.clone())
    }

    pub fn contains(&self, tx_id: u64) -> bool {
        self.transactions.contains_key(&tx_id)
    }

    /// Up to `max_count` transactions, highest fee density first.
    pub fn select_transactions(&self, max_count: usize) -> Vec<Transaction> {
        let index = self.fee_index.read();
        index
            .values()
            .filter_map(|id| self.transactions.get(id).map(|e| e.transaction.clone()))
            .take(max_count)
            .collect()
    }

    pub fn size(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn clear(&self) {
        let mut index = self.fee_index.write();
        self.transactions.clear();
        index.clear();
        self.sender_counts.clear();
    }

    /// Removes transactions whose deadline passed before chain time `now`.
    /// Returns how many were dropped.
    pub fn expire_old(&self, now: u32) -> usize {
        // Collect first; no DashMap iterator may be held while mutating.
        let expired: Vec<u64> = self
            .transactions
            .iter()
            .filter(|entry| entry.value().transaction.expiration() < now)
            .map(|entry| *entry.key())
            .collect();

        for &id in &expired {
            self.remove(id);
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), now, "expired pool transactions");
        }
        expired.len()
    }

    /// Re-runs the EC check on every entry and drops those that no longer
    /// pass, e.g. after a reorg orphaned their anchor. Returns how many were
    /// dropped. Without a verifier this is a no-op.
    pub fn revalidate(&self) -> usize {
        let Some(verifier) = &self.verifier else {
            return 0;
        };

        let stale: Vec<u64> = self
            .transactions
            .iter()
            .filter(|entry| !verifier.verify(&entry.value().transaction))
            .map(|entry| *entry.key())
            .collect();

        for &id in &stale {
            self.remove(id);
        }
        if !stale.is_empty() {
            info!(count = stale.len(), "dropped transactions with stale EC anchors");
        }
        stale.len()
    }

    /// Number of pending transactions counted against `sender`'s limit.
    pub fn sender_count(&self, sender: &[u8; 32]) -> usize {
        self.sender_counts.get(sender).map_or(0, |v| *v)
    }

    /// All pending transactions signed by `sender`.
    pub fn pending_for_sender(&self, sender: &[u8; 32]) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|entry| entry.value().transaction.sender_public_key.as_bytes() == sender)
            .map(|entry| entry.value().transaction.clone())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Evict the cheapest entry if `incoming_fpb` outbids it. The caller
    /// holds the fee index write lock.
    fn evict_lowest(&self, index: &mut BTreeMap<FeeKey, u64>, incoming_fpb: u64) -> bool {
        let Some(lowest_key) = index.keys().next_back().cloned() else {
            return false;
        };
        let lowest_fpb = u64::MAX - lowest_key.inverted_fee;
        if incoming_fpb <= lowest_fpb {
            return false;
        }

        let Some(evicted_id) = index.remove(&lowest_key) else {
            return false;
        };
        if let Some((_, entry)) = self.transactions.remove(&evicted_id) {
            self.decrement_sender_count(entry.transaction.sender_public_key.as_bytes());
            debug!(tx = evicted_id, "evicted lowest-fee transaction");
        }
        true
    }

    /// Callers hold the fee index write lock, so counts never race an
    /// admission.
    fn decrement_sender_count(&self, sender: &SenderKey) {
        if let Some(mut count) = self.sender_counts.get_mut(sender) {
            if *count <= 1 {
                drop(count);
                self.sender_counts.remove(sender);
            } else {
                *count -= 1;
            }
        }
    }
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new(MempoolConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EcParams, ONE_COIN};
    use crate::consensus::{Collaborators, FluxSchedule};
    use crate::crypto::keys::BurstKeypair;
    use crate::storage::{Block, BlockBuilder, Chain, MemoryChain};
    use crate::transaction::{sign_transaction, TransactionBuilder, TransactionType};

    const NOW: u32 = 10_000;

    /// Signed payment from `sender`; `nonce` varies the id.
    fn make_tx(sender: &BurstKeypair, fee: u64, nonce: u32) -> Transaction {
        let mut tx = TransactionBuilder::new(TransactionType::Payment, sender.public_key())
            .recipient(7)
            .amount_nqt(1_000)
            .fee_nqt(fee)
            .timestamp(NOW + nonce)
            .build();
        sign_transaction(&mut tx, sender);
        tx
    }

    fn make_tx_with_fee(fee: u64, nonce: u32) -> Transaction {
        make_tx(&BurstKeypair::from_seed(&[1u8; 32]), fee, nonce)
    }

    // -- Basic add / get / contains -----------------------------------------

    #[test]
    fn add_and_retrieve_transaction() {
        let pool = Mempool::default();
        let tx = make_tx_with_fee(100_000, 1);
        pool.add(tx.clone(), NOW).unwrap();

        let retrieved = pool.get(tx.id).unwrap();
        assert_eq!(retrieved, tx);
        assert_eq!(pool.size(), 1);
        assert!(pool.contains(tx.id));
        assert!(pool.get(tx.id ^ 1).is_none());
    }

    #[test]
    fn rejects_duplicate_transaction() {
        let pool = Mempool::default();
        let tx = make_tx_with_fee(100_000, 1);
        pool.add(tx.clone(), NOW).unwrap();
        assert_eq!(pool.add(tx, NOW), Err(MempoolError::DuplicateTransaction));
    }

    #[test]
    fn rejects_fee_too_low() {
        let pool = Mempool::new(MempoolConfig {
            min_fee_nqt: 735_000,
            ..Default::default()
        });
        assert_eq!(
            pool.add(make_tx_with_fee(734_999, 1), NOW),
            Err(MempoolError::FeeTooLow {
                min: 735_000,
                got: 734_999
            })
        );
        assert!(pool.add(make_tx_with_fee(735_000, 2), NOW).is_ok());
    }

    #[test]
    fn rejects_expired_transaction() {
        let pool = Mempool::default();
        let tx = make_tx_with_fee(100_000, 0);
        let late = tx.expiration() + 1;
        assert!(matches!(
            pool.add(tx, late),
            Err(MempoolError::Expired { .. })
        ));
    }

    #[test]
    fn rejects_badly_signed_transaction() {
        let pool = Mempool::default();
        let mut tx = make_tx_with_fee(100_000, 1);
        sign_transaction(&mut tx, &BurstKeypair::generate());
        assert!(matches!(
            pool.add(tx, NOW),
            Err(MempoolError::Invalid(TransactionError::InvalidSignature { .. }))
        ));
    }

    // -- Sender limits --------------------------------------------------------

    #[test]
    fn enforces_sender_limit() {
        let pool = Mempool::new(MempoolConfig {
            max_per_sender: 2,
            ..Default::default()
        });
        let alice = BurstKeypair::generate();
        let bob = BurstKeypair::generate();

        let first = make_tx(&alice, 100_000, 1);
        pool.add(first.clone(), NOW).unwrap();
        pool.add(make_tx(&alice, 100_000, 2), NOW).unwrap();
        assert!(matches!(
            pool.add(make_tx(&alice, 100_000, 3), NOW),
            Err(MempoolError::SenderLimitExceeded { limit: 2, .. })
        ));
        // Other senders are unaffected.
        assert!(pool.add(make_tx(&bob, 100_000, 1), NOW).is_ok());

        // Removing one of Alice's frees a slot.
        pool.remove(first.id);
        assert!(pool.add(make_tx(&alice, 100_000, 4), NOW).is_ok());
        assert_eq!(pool.pending_for_sender(alice.public_key().as_bytes()).len(), 2);
    }

    // -- Capacity and ordering --------------------------------------------

    #[test]
    fn full_pool_evicts_lowest_fee() {
        let pool = Mempool::new(MempoolConfig {
            max_size: 2,
            ..Default::default()
        });
        let cheap = make_tx_with_fee(100_000, 1);
        let mid = make_tx_with_fee(500_000, 2);
        let rich = make_tx_with_fee(ONE_COIN, 3);

        pool.add(cheap.clone(), NOW).unwrap();
        pool.add(mid.clone(), NOW).unwrap();
        pool.add(rich.clone(), NOW).unwrap();

        assert_eq!(pool.size(), 2);
        assert!(!pool.contains(cheap.id));
        assert!(pool.contains(mid.id) && pool.contains(rich.id));
    }

    #[test]
    fn full_pool_rejects_lowest_incoming() {
        let pool = Mempool::new(MempoolConfig {
            max_size: 1,
            ..Default::default()
        });
        pool.add(make_tx_with_fee(500_000, 1), NOW).unwrap();
        assert_eq!(
            pool.add(make_tx_with_fee(100_000, 2), NOW),
            Err(MempoolError::MempoolFull { size: 1 })
        );
    }

    #[test]
    fn select_returns_highest_fee_first() {
        let pool = Mempool::default();
        let low = make_tx_with_fee(100_000, 1);
        let high = make_tx_with_fee(ONE_COIN, 2);
        let mid = make_tx_with_fee(500_000, 3);
        for tx in [low.clone(), high.clone(), mid.clone()] {
            pool.add(tx, NOW).unwrap();
        }

        let ids: Vec<u64> = pool.select_transactions(10).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![high.id, mid.id, low.id]);
        assert_eq!(pool.select_transactions(1).len(), 1);
        assert!(Mempool::default().select_transactions(5).is_empty());
    }

    #[test]
    fn remove_batch_after_block_inclusion() {
        let pool = Mempool::default();
        let a = make_tx_with_fee(100_000, 1);
        let b = make_tx_with_fee(200_000, 2);
        let c = make_tx_with_fee(300_000, 3);
        for tx in [a.clone(), b.clone(), c.clone()] {
            pool.add(tx, NOW).unwrap();
        }

        pool.remove_batch(&[a.id, c.id, 12345]);
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.select_transactions(10)[0].id, b.id);
    }

    #[test]
    fn expire_old_uses_deadlines() {
        let pool = Mempool::default();
        let sender = BurstKeypair::generate();
        let mut short = TransactionBuilder::new(TransactionType::Payment, sender.public_key())
            .timestamp(NOW)
            .deadline(1)
            .fee_nqt(100_000)
            .build();
        sign_transaction(&mut short, &sender);
        let long = make_tx(&sender, 100_000, 1);

        pool.add(short.clone(), NOW).unwrap();
        pool.add(long.clone(), NOW).unwrap();

        assert_eq!(pool.expire_old(NOW + 60), 0);
        assert_eq!(pool.expire_old(NOW + 61), 1);
        assert!(!pool.contains(short.id));
        assert!(pool.contains(long.id));
    }

    #[test]
    fn clear_empties_the_pool() {
        let pool = Mempool::default();
        pool.add(make_tx_with_fee(100_000, 1), NOW).unwrap();
        pool.clear();
        assert!(pool.is_empty());
        assert!(pool.select_transactions(10).is_empty());
    }

    #[test]
    fn concurrent_add_and_remove() {
        use std::thread;

        let pool = Arc::new(Mempool::default());
        let mut handles = vec![];

        for i in 0..8u8 {
            let pool = Arc::clone(&pool);
            handles.push(thread::spawn(move || {
                let sender = BurstKeypair::from_seed(&[i; 32]);
                for nonce in 1..=20u32 {
                    let _ = pool.add(make_tx(&sender, 100_000 + u64::from(nonce), nonce), NOW);
                }
            }));
        }
        for _ in 0..4 {
            let pool = Arc::clone(&pool);
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    let _ = pool.size();
                    for tx in pool.select_transactions(3) {
                        pool.remove(tx.id);
                    }
                }
            }));
        }
        for h in handles {
            h.join().expect("thread panicked");
        }

        assert!(pool.size() <= 160);
        assert_eq!(pool.select_transactions(usize::MAX).len(), pool.size());
    }

    #[test]
    fn concurrent_duplicates_admit_once() {
        use std::sync::Barrier;
        use std::thread;

        const THREADS: usize = 8;
        let sender = BurstKeypair::from_seed(&[3u8; 32]);
        let tx = make_tx(&sender, 100_000, 1);

        for _ in 0..20 {
            let pool = Arc::new(Mempool::default());
            let barrier = Arc::new(Barrier::new(THREADS));
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let pool = Arc::clone(&pool);
                    let barrier = Arc::clone(&barrier);
                    let tx = tx.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        pool.add(tx, NOW)
                    })
                })
                .collect();

            let results: Vec<_> = handles
                .into_iter()
                .map(|h| h.join().expect("thread panicked"))
                .collect();
            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(results
                .iter()
                .filter(|r| r.is_err())
                .all(|r| *r == Err(MempoolError::DuplicateTransaction)));

            let sender_key = *sender.public_key().as_bytes();
            assert_eq!(pool.size(), 1);
            assert_eq!(pool.sender_count(&sender_key), 1);

            pool.remove(tx.id);
            assert!(pool.is_empty());
            assert_eq!(pool.sender_count(&sender_key), 0);
        }
    }

    #[test]
    fn concurrent_admissions_respect_sender_limit() {
        use std::sync::Barrier;
        use std::thread;

        let config = MempoolConfig {
            max_per_sender: 3,
            ..MempoolConfig::default()
        };
        let pool = Arc::new(Mempool::new(config));
        let sender = BurstKeypair::from_seed(&[4u8; 32]);
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (1..=8u32)
            .map(|nonce| {
                let pool = Arc::clone(&pool);
                let barrier = Arc::clone(&barrier);
                let tx = make_tx(&sender, 100_000, nonce);
                thread::spawn(move || {
                    barrier.wait();
                    pool.add(tx, NOW).is_ok()
                })
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .filter(|ok| *ok)
            .count();

        assert_eq!(admitted, 3);
        assert_eq!(pool.size(), 3);
        assert_eq!(pool.sender_count(sender.public_key().as_bytes()), 3);
    }

    // -- Economic clustering ------------------------------------------------

    /// Signed chain where every block carries a 1-coin-fee payment.
    fn ec_chain(len: u64) -> Arc<MemoryChain> {
        let chain = Arc::new(MemoryChain::new());
        let forger = BurstKeypair::from_seed(&[3u8; 32]);
        let payer = BurstKeypair::from_seed(&[4u8; 32]);
        for _ in 0..len {
            let tip = chain.tip().unwrap();
            let anchor = chain.block_at_height(tip.height.saturating_sub(9)).unwrap();
            let mut fee_tx = TransactionBuilder::new(TransactionType::Payment, payer.public_key())
                .fee_nqt(ONE_COIN)
                .timestamp(tip.timestamp)
                .ec_anchor(&anchor)
                .build();
            sign_transaction(&mut fee_tx, &payer);
            let mut block = BlockBuilder::new(&tip)
                .generator(forger.public_key())
                .transactions(vec![fee_tx])
                .build();
            block.sign(&forger);
            chain.append(block).unwrap();
        }
        chain
    }

    fn ec_pool(chain: &Arc<MemoryChain>) -> Mempool {
        let collaborators =
            Collaborators::new(chain.clone()).features(Arc::new(FluxSchedule::all_active()));
        let params = EcParams {
            ec_change_height: 0,
            ..EcParams::default()
        };
        let verifier = Arc::new(ForkVerifier::new(collaborators, params));
        Mempool::with_verifier(MempoolConfig::default(), verifier)
    }

    fn anchored(sender: &BurstKeypair, anchor: &Block, timestamp: u32) -> Transaction {
        let mut tx = TransactionBuilder::new(TransactionType::Payment, sender.public_key())
            .recipient(9)
            .fee_nqt(100_000)
            .timestamp(timestamp)
            .ec_anchor(anchor)
            .build();
        sign_transaction(&mut tx, sender);
        tx
    }

    #[test]
    fn admits_transaction_with_canonical_anchor() {
        let chain = ec_chain(30);
        let pool = ec_pool(&chain);
        let tip = chain.tip().unwrap();
        let anchor = chain.block_at_height(25).unwrap();
        let tx = anchored(&BurstKeypair::generate(), &anchor, tip.timestamp);

        assert!(pool.add(tx, tip.timestamp).is_ok());
    }

    #[test]
    fn ec_rejection_is_opaque() {
        let chain = ec_chain(30);
        let pool = ec_pool(&chain);
        let tip = chain.tip().unwrap();
        let stranger = BlockBuilder::new(&chain.block_at_height(24).unwrap())
            .timestamp(1)
            .build();
        let tx = anchored(&BurstKeypair::generate(), &stranger, tip.timestamp);

        assert_eq!(
            pool.add(tx, tip.timestamp),
            Err(MempoolError::EconomicClusteringRejected)
        );
    }

    #[test]
    fn revalidate_drops_orphaned_anchors() {
        let chain = ec_chain(30);
        let pool = ec_pool(&chain);
        let tip = chain.tip().unwrap();
        let sender = BurstKeypair::generate();
        let deep = anchored(&sender, &chain.block_at_height(20).unwrap(), tip.timestamp);
        let shallow = anchored(&sender, &chain.block_at_height(27).unwrap(), tip.timestamp);
        pool.add(deep.clone(), tip.timestamp).unwrap();
        pool.add(shallow.clone(), tip.timestamp).unwrap();
        assert_eq!(pool.revalidate(), 0);

        // Reorg below the shallow anchor and rebuild with different blocks.
        chain.pop_off_to(25);
        let forger = BurstKeypair::generate();
        let mut parent = chain.tip().unwrap();
        for _ in 0..5 {
            let mut block = BlockBuilder::new(&parent)
                .timestamp(parent.timestamp + 239)
                .generator(forger.public_key())
                .build();
            block.sign(&forger);
            parent = chain.append(block).unwrap();
        }

        assert_eq!(pool.revalidate(), 1);
        assert!(pool.contains(deep.id));
        assert!(!pool.contains(shallow.id));
    }
}
