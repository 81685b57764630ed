//! Height-gated protocol features ("flux capacitor") and block-time lookup.
//!
//! Rules on a long-lived chain switch on at fixed heights. Rather than
//! consulting a global, every component that cares receives a
//! [`FeatureToggle`] at construction and asks it about a specific height.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{BLOCK_TIME, DIGITAL_GOODS_STORE_HEIGHT, POC_PLUS_HEIGHT};

// ---------------------------------------------------------------------------
// Feature
// ---------------------------------------------------------------------------

/// A protocol rule that activates at some height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Marketplace transactions.
    DigitalGoodsStore,
    /// Fork verification of transaction EC anchors.
    EconomicClustering,
    /// Proof-of-capacity-plus plot format.
    PocPlus,
}

impl Feature {
    /// Every known feature, in activation order on mainnet.
    pub const ALL: [Feature; 3] = [
        Feature::DigitalGoodsStore,
        Feature::EconomicClustering,
        Feature::PocPlus,
    ];
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DigitalGoodsStore => write!(f, "digital_goods_store"),
            Self::EconomicClustering => write!(f, "economic_clustering"),
            Self::PocPlus => write!(f, "poc_plus"),
        }
    }
}

/// Answers "is this rule in force at this height?".
pub trait FeatureToggle: Send + Sync {
    fn is_active(&self, feature: Feature, height: u64) -> bool;
}

// ---------------------------------------------------------------------------
// FluxSchedule
// ---------------------------------------------------------------------------

/// Static activation table. A feature with no entry is never active.
///
/// ```
/// use burst_protocol::consensus::{Feature, FeatureToggle, FluxSchedule};
///
/// let schedule = FluxSchedule::new().with(Feature::EconomicClustering, 100);
/// assert!(!schedule.is_active(Feature::EconomicClustering, 99));
/// assert!(schedule.is_active(Feature::EconomicClustering, 100));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FluxSchedule {
    activations: BTreeMap<Feature, u64>,
}

impl FluxSchedule {
    /// Empty schedule: nothing is ever active.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mainnet activation heights. Economic Clustering enforcement went
    /// live together with the digital goods store.
    pub fn mainnet() -> Self {
        Self::new()
            .with(Feature::DigitalGoodsStore, DIGITAL_GOODS_STORE_HEIGHT)
            .with(Feature::EconomicClustering, DIGITAL_GOODS_STORE_HEIGHT)
            .with(Feature::PocPlus, POC_PLUS_HEIGHT)
    }

    /// Every feature active from genesis. Typical for devnets.
    pub fn all_active() -> Self {
        Feature::ALL
            .iter()
            .fold(Self::new(), |schedule, &feature| schedule.with(feature, 0))
    }

    /// Set (or move) the activation height of `feature`.
    pub fn with(mut self, feature: Feature, height: u64) -> Self {
        self.activations.insert(feature, height);
        self
    }

    /// Activation height of `feature`, if it is scheduled at all.
    pub fn activation_height(&self, feature: Feature) -> Option<u64> {
        self.activations.get(&feature).copied()
    }
}

impl FeatureToggle for FluxSchedule {
    fn is_active(&self, feature: Feature, height: u64) -> bool {
        self.activation_height(feature)
            .is_some_and(|activation| height >= activation)
    }
}

// ---------------------------------------------------------------------------
// Block time
// ---------------------------------------------------------------------------

/// Target spacing between blocks at a given height.
pub trait AverageBlockInterval: Send + Sync {
    fn at(&self, height: u64) -> Duration;
}

/// The same interval at every height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBlockTime(pub Duration);

impl Default for FixedBlockTime {
    fn default() -> Self {
        Self(BLOCK_TIME)
    }
}

impl AverageBlockInterval for FixedBlockTime {
    fn at(&self, _height: u64) -> Duration {
        self.0
    }
}

/// Piecewise-constant interval: each entry applies from its height until
/// the next entry. Heights below the first entry use the default block time.
#[derive(Debug, Clone, Default)]
pub struct BlockTimeSchedule {
    steps: BTreeMap<u64, Duration>,
}

impl BlockTimeSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `interval` from `height` onward.
    pub fn with(mut self, height: u64, interval: Duration) -> Self {
        self.steps.insert(height, interval);
        self
    }
}

impl AverageBlockInterval for BlockTimeSchedule {
    fn at(&self, height: u64) -> Duration {
        self.steps
            .range(..=height)
            .next_back()
            .map_or(BLOCK_TIME, |(_, interval)| *interval)
    }
}
