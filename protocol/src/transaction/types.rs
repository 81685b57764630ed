//! Core type definitions for transactions.
//!
//! The EC core treats a transaction's type and attachment as opaque. The
//! type still travels in the signed bytes, so it needs a stable wire code.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

/// Discriminant for the operation a transaction represents.
///
/// Type-specific attachment semantics live outside this crate; here the type
/// only contributes its [`code`](TransactionType::code) to the signed bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Ordinary value transfer.
    Payment,
    /// Arbitrary message, plain or encrypted.
    Message,
    /// Alias registration or transfer.
    Alias,
    /// Asset exchange order placement or cancellation.
    AssetExchange,
    /// Digital goods store listing, purchase or delivery.
    DigitalGoods,
    /// Reward recipient assignment for pooled forging.
    RewardRecipient,
    /// Recurring payment subscription.
    Subscription,
}

impl TransactionType {
    /// Stable single-byte wire code.
    pub fn code(self) -> u8 {
        match self {
            Self::Payment => 0,
            Self::Message => 1,
            Self::Alias => 2,
            Self::AssetExchange => 3,
            Self::DigitalGoods => 4,
            Self::RewardRecipient => 20,
            Self::Subscription => 21,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payment => write!(f, "Payment"),
            Self::Message => write!(f, "Message"),
            Self::Alias => write!(f, "Alias"),
            Self::AssetExchange => write!(f, "AssetExchange"),
            Self::DigitalGoods => write!(f, "DigitalGoods"),
            Self::RewardRecipient => write!(f, "RewardRecipient"),
            Self::Subscription => write!(f, "Subscription"),
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionStatus
// ---------------------------------------------------------------------------

/// Where a transaction sits in its lifecycle, from the pool's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Admitted to the unconfirmed pool.
    Pending,
    /// Included in a block on the canonical chain.
    Confirmed,
    /// Rejected by validation (EC or structural).
    Rejected,
    /// Deadline passed before inclusion.
    Expired,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Confirmed => write!(f, "Confirmed"),
            Self::Rejected => write!(f, "Rejected"),
            Self::Expired => write!(f, "Expired"),
        }
    }
}
