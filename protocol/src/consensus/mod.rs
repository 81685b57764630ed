//! # Economic Clustering
//!
//! Nothing-at-stake defense for a proof-of-capacity chain. Every transaction
//! commits to a recent block on the chain its sender saw (the "EC anchor").
//! A node only accepts the transaction if that anchor sits on its own
//! canonical chain and the chain beneath it carries real difficulty and real
//! economic activity. Transactions cannot be replayed onto a fork that
//! does not contain their anchor, so a fork cannot borrow the main chain's
//! economic weight.
//!
//! ## Components
//!
//! ```text
//! anchor.rs         — AnchorSelector: tip → anchor for a new transaction
//! fork.rs           — ForkVerifier: transaction → accept / reject
//! flux.rs           — height-gated features, block time lookup
//! authenticator.rs  — block signature, economic weight, sender key checks
//! ```
//!
//! Both components are read-only over a shared [`Chain`] and a fixed set of
//! [`Collaborators`]. [`EconomicClustering`] bundles them.
//!
//! ## Eras
//!
//! The rule changed once, at `EcParams::ec_change_height`. Below it
//! ([`Era::Legacy`]) anchors are resolved by id, the anchor must lie within
//! the distance limit of the current height, and every transaction in the
//! verification window must lie within the limit of its block. From the
//! change height on ([`Era::Modern`]) the anchor is resolved by height and
//! those distance bounds are dropped.

pub mod anchor;
pub mod authenticator;
pub mod flux;
pub mod fork;

use std::sync::Arc;

use crate::config::{EcParams, ParamsError};
use crate::storage::{Block, Chain};
use crate::transaction::Transaction;

pub use anchor::{AnchorSelector, EcError};
pub use authenticator::{
    BlockAuthenticator, SignedBlockAuthenticator, SignedTransactionAuthenticator,
    TransactionAuthenticator,
};
pub use flux::{
    AverageBlockInterval, BlockTimeSchedule, Feature, FeatureToggle, FixedBlockTime, FluxSchedule,
};
pub use fork::{ForkRejection, ForkVerifier};

// ---------------------------------------------------------------------------
// Era
// ---------------------------------------------------------------------------

/// Which variant of the rule applies at a height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Era {
    /// Before `ec_change_height`.
    Legacy,
    /// At or after `ec_change_height`.
    Modern,
}

impl Era {
    pub fn at(height: u64, params: &EcParams) -> Self {
        if height < params.ec_change_height {
            Era::Legacy
        } else {
            Era::Modern
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// The read-only services both EC components depend on.
///
/// [`Collaborators::new`] fills in the stock implementations: Ed25519
/// authenticators, the mainnet feature schedule and a fixed block time.
/// Swap any of them with the builder methods.
#[derive(Clone)]
pub struct Collaborators {
    pub chain: Arc<dyn Chain>,
    pub block_authenticator: Arc<dyn BlockAuthenticator>,
    pub transaction_authenticator: Arc<dyn TransactionAuthenticator>,
    pub features: Arc<dyn FeatureToggle>,
    pub block_time: Arc<dyn AverageBlockInterval>,
}

impl Collaborators {
    pub fn new(chain: Arc<dyn Chain>) -> Self {
        Self {
            chain,
            block_authenticator: Arc::new(SignedBlockAuthenticator),
            transaction_authenticator: Arc::new(SignedTransactionAuthenticator),
            features: Arc::new(FluxSchedule::mainnet()),
            block_time: Arc::new(FixedBlockTime::default()),
        }
    }

    pub fn block_authenticator(mut self, authenticator: Arc<dyn BlockAuthenticator>) -> Self {
        self.block_authenticator = authenticator;
        self
    }

    pub fn transaction_authenticator(
        mut self,
        authenticator: Arc<dyn TransactionAuthenticator>,
    ) -> Self {
        self.transaction_authenticator = authenticator;
        self
    }

    pub fn features(mut self, features: Arc<dyn FeatureToggle>) -> Self {
        self.features = features;
        self
    }

    pub fn block_time(mut self, block_time: Arc<dyn AverageBlockInterval>) -> Self {
        self.block_time = block_time;
        self
    }
}

// ---------------------------------------------------------------------------
// EconomicClustering
// ---------------------------------------------------------------------------

/// Anchor selection and fork verification over one set of collaborators.
///
/// ```
/// use std::sync::Arc;
/// use burst_protocol::config::EcParams;
/// use burst_protocol::consensus::{Collaborators, EconomicClustering};
/// use burst_protocol::storage::MemoryChain;
///
/// let chain = Arc::new(MemoryChain::new());
/// let ec = EconomicClustering::new(Collaborators::new(chain), EcParams::default()).unwrap();
/// assert_eq!(ec.select_anchor(0).unwrap().height, 0);
/// ```
pub struct EconomicClustering {
    selector: AnchorSelector,
    verifier: Arc<ForkVerifier>,
}

impl EconomicClustering {
    /// # Errors
    ///
    /// Returns [`ParamsError`] if `params` fails [`EcParams::validate`].
    pub fn new(collaborators: Collaborators, params: EcParams) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(Self {
            selector: AnchorSelector::new(Arc::clone(&collaborators.chain), params),
            verifier: Arc::new(ForkVerifier::new(collaborators, params)),
        })
    }

    /// See [`AnchorSelector::select_anchor`].
    pub fn select_anchor(&self, timestamp: u32) -> Result<Arc<Block>, EcError> {
        self.selector.select_anchor(timestamp)
    }

    /// See [`ForkVerifier::verify`].
    pub fn verify_fork(&self, tx: &Transaction) -> bool {
        self.verifier.verify(tx)
    }

    /// Shared handle to the verifier, e.g. for the transaction pool.
    pub fn verifier(&self) -> Arc<ForkVerifier> {
        Arc::clone(&self.verifier)
    }

    pub fn params(&self) -> &EcParams {
        self.selector.params()
    }

    pub fn era(&self, height: u64) -> Era {
        Era::at(height, self.params())
    }
}
