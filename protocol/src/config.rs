//! # Protocol Configuration & Constants
//!
//! Every magic number of the chain lives here. If you're hardcoding a
//! constant somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Most of these values are consensus-critical. Two nodes that disagree on
//! `EC_BLOCK_DISTANCE_LIMIT` will disagree on which transactions are valid,
//! and that is a fork with extra steps.
//!
//! The Economic Clustering knobs are also collected into [`EcParams`] so
//! tests and private networks can tune them without recompiling.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Network Identifiers
// ---------------------------------------------------------------------------

/// Mainnet. Mistakes here cost real money.
pub const NETWORK_ID_MAINNET: u32 = 0x4255_5253; // "BURS"

/// Testnet, where we break things on purpose and call it "testing."
pub const NETWORK_ID_TESTNET: u32 = 0x4255_5254; // "BURT"

/// Local development network. Reset whenever someone feels like it.
pub const NETWORK_ID_DEVNET: u32 = 0x4255_5244; // "BURD"

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full protocol version string.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Block format version written into every forged block.
pub const BLOCK_VERSION: u32 = 3;

/// Transaction format version.
pub const TRANSACTION_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Chain epoch: 2014-08-11 02:00:00 UTC. All block and transaction
/// timestamps are seconds since this instant, stored as `u32`.
pub const EPOCH_BEGINNING_UNIX: i64 = 1_407_722_400;

/// Target block time. Four minutes, the Burst classic.
pub const BLOCK_TIME: Duration = Duration::from_secs(240);

/// Block time as plain seconds, for timestamp arithmetic.
/// Keep this in sync with BLOCK_TIME or face the wrath of the tests.
pub const BLOCK_TIME_SECS: u32 = 240;

// ---------------------------------------------------------------------------
// Economic Clustering
// ---------------------------------------------------------------------------

/// How far (seconds) a new transaction's timestamp may lag behind the tip
/// when asking for its EC anchor.
pub const MAX_TIMESTAMP_DIFFERENCE: u32 = 15;

/// Anchor horizon in seconds. The anchor is the newest block at least this
/// much older than the transaction.
pub const EC_RULE_TERMINATOR: u32 = 2_400;

/// Hard cap on how many blocks behind the tip an anchor may sit.
pub const EC_BLOCK_DISTANCE_LIMIT: u64 = 60;

/// Number of ancestor blocks walked when verifying a claimed anchor.
pub const EC_VERIFICATION_DEPTH: usize = 10;

/// Height of the EC rule upgrade. Below it the legacy rule set applies
/// (id-first anchor resolution and explicit distance bounds).
pub const EC_CHANGE_BLOCK_1: u64 = 67_000;

/// Maximum age (seconds, relative to the tip) of any block visited during
/// fork verification. Twice the expected span of a maximum-distance anchor
/// plus the verification window.
pub const MAX_ANCESTOR_AGE: u32 =
    2 * (EC_BLOCK_DISTANCE_LIMIT as u32 + EC_VERIFICATION_DEPTH as u32) * BLOCK_TIME_SECS;

// ---------------------------------------------------------------------------
// Amounts & Forging
// ---------------------------------------------------------------------------

/// One coin in its smallest unit (NQT).
pub const ONE_COIN: u64 = 100_000_000;

/// Total supply cap in NQT.
pub const MAX_BALANCE_NQT: u64 = 2_158_812_800 * ONE_COIN;

/// Base target of the genesis block.
pub const INITIAL_BASE_TARGET: u64 = 18_325_193_796;

/// Default transaction deadline in minutes.
pub const DEFAULT_DEADLINE_MINUTES: u16 = 1_440;

/// Largest accepted attachment, in bytes.
pub const MAX_ATTACHMENT_BYTES: usize = 1_000;

// ---------------------------------------------------------------------------
// Feature activation (mainnet)
// ---------------------------------------------------------------------------

/// Digital goods store activation. Economic Clustering enforcement rides
/// along with it.
pub const DIGITAL_GOODS_STORE_HEIGHT: u64 = 11_800;

/// Proof-of-capacity-plus activation.
pub const POC_PLUS_HEIGHT: u64 = 878_000;

// ---------------------------------------------------------------------------
// EcParams
// ---------------------------------------------------------------------------

/// Errors raised when an [`EcParams`] set is unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("ec_verification_depth must be at least 1")]
    ZeroVerificationDepth,

    #[error("ec_block_distance_limit must be at least 1")]
    ZeroDistanceLimit,

    #[error("max_ancestor_age ({age}s) must exceed ec_rule_terminator ({terminator}s)")]
    AncestorAgeTooSmall { age: u32, terminator: u32 },
}

/// Tunable Economic Clustering parameters.
///
/// `Default` yields the mainnet constants above. Private networks and tests
/// override individual fields with struct update syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcParams {
    /// See [`MAX_TIMESTAMP_DIFFERENCE`].
    pub max_timestamp_difference: u32,
    /// See [`EC_RULE_TERMINATOR`].
    pub ec_rule_terminator: u32,
    /// See [`EC_BLOCK_DISTANCE_LIMIT`].
    pub ec_block_distance_limit: u64,
    /// See [`EC_VERIFICATION_DEPTH`].
    pub ec_verification_depth: usize,
    /// See [`EC_CHANGE_BLOCK_1`].
    pub ec_change_height: u64,
    /// See [`MAX_ANCESTOR_AGE`].
    pub max_ancestor_age: u32,
}

impl Default for EcParams {
    fn default() -> Self {
        Self {
            max_timestamp_difference: MAX_TIMESTAMP_DIFFERENCE,
            ec_rule_terminator: EC_RULE_TERMINATOR,
            ec_block_distance_limit: EC_BLOCK_DISTANCE_LIMIT,
            ec_verification_depth: EC_VERIFICATION_DEPTH,
            ec_change_height: EC_CHANGE_BLOCK_1,
            max_ancestor_age: MAX_ANCESTOR_AGE,
        }
    }
}

impl EcParams {
    /// Rejects parameter sets that would make the EC walks meaningless.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.ec_verification_depth == 0 {
            return Err(ParamsError::ZeroVerificationDepth);
        }
        if self.ec_block_distance_limit == 0 {
            return Err(ParamsError::ZeroDistanceLimit);
        }
        if self.max_ancestor_age <= self.ec_rule_terminator {
            return Err(ParamsError::AncestorAgeTooSmall {
                age: self.max_ancestor_age,
                terminator: self.ec_rule_terminator,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Returns a friendly name for a network ID, mainly for logging.
pub fn network_name(network_id: u32) -> String {
    match network_id {
        NETWORK_ID_MAINNET => "mainnet".to_string(),
        NETWORK_ID_TESTNET => "testnet".to_string(),
        NETWORK_ID_DEVNET => "devnet".to_string(),
        other => format!("unknown(0x{:08X})", other),
    }
}

/// Converts a chain timestamp to wall-clock UTC.
pub fn epoch_to_datetime(timestamp: u32) -> DateTime<Utc> {
    Utc.timestamp_opt(EPOCH_BEGINNING_UNIX + i64::from(timestamp), 0)
        .single()
        .unwrap_or_default()
}

/// Current wall-clock time as a chain timestamp. Saturates at the epoch for
/// clocks set before 2014 and at `u32::MAX` far in the future.
pub fn current_epoch_time() -> u32 {
    let secs = Utc::now().timestamp() - EPOCH_BEGINNING_UNIX;
    secs.clamp(0, i64::from(u32::MAX)) as u32
}
