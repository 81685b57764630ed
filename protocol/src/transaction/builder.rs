//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] enforces a disciplined construction flow:
//! set the fields, stamp the EC anchor, call `.build()`, and get back an
//! unsigned [`Transaction`] with a deterministic id derived from its contents.
//!
//! The builder does not sign -- that happens in [`super::signing`].

use serde::{Deserialize, Serialize};

use super::types::TransactionType;
use crate::config::{current_epoch_time, DEFAULT_DEADLINE_MINUTES, TRANSACTION_VERSION};
use crate::crypto::hash::id_of;
use crate::crypto::keys::{BurstPublicKey, BurstSignature};
use crate::storage::Block;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A chain transaction.
///
/// The `id` is derived from [`Transaction::signable_bytes`], which covers
/// every field except `id` and `signature`. The id is therefore stable across
/// signing, and it commits to the EC anchor (`ec_block_id`,
/// `ec_block_height`): re-anchoring a transaction changes its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// First 8 bytes (LE) of `sha256(signable_bytes)`.
    pub id: u64,

    /// Transaction format version.
    pub version: u8,

    /// Operation type. Opaque to the EC rule.
    pub tx_type: TransactionType,

    /// Creation time, seconds since the chain epoch.
    pub timestamp: u32,

    /// Minutes after `timestamp` during which the transaction may be included.
    pub deadline: u16,

    /// Public key of the sender. Bound into the id and the signature.
    pub sender_public_key: BurstPublicKey,

    /// Recipient account id, if the type has one.
    pub recipient: Option<u64>,

    /// Amount transferred, in NQT.
    pub amount_nqt: u64,

    /// Fee paid to the forger, in NQT.
    pub fee_nqt: u64,

    /// Height of the EC anchor block the sender committed to.
    pub ec_block_height: u64,

    /// Id of the EC anchor block the sender committed to.
    pub ec_block_id: u64,

    /// Type-specific payload, never interpreted here.
    #[serde(default, with = "hex_bytes")]
    pub attachment: Vec<u8>,

    /// Signature over [`Transaction::signable_bytes`]. `None` until signed.
    pub signature: Option<BurstSignature>,
}

impl Transaction {
    /// Canonical byte representation used for signing and id computation.
    ///
    /// Fixed-width little-endian integers in declaration order, the recipient
    /// encoded as `0` when absent, and a length-prefixed attachment.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(128 + self.attachment.len());
        buf.push(self.version);
        buf.push(self.tx_type.code());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        buf.extend_from_slice(&self.deadline.to_le_bytes());
        buf.extend_from_slice(self.sender_public_key.as_bytes());
        buf.extend_from_slice(&self.recipient.unwrap_or(0).to_le_bytes());
        buf.extend_from_slice(&self.amount_nqt.to_le_bytes());
        buf.extend_from_slice(&self.fee_nqt.to_le_bytes());
        buf.extend_from_slice(&self.ec_block_height.to_le_bytes());
        buf.extend_from_slice(&self.ec_block_id.to_le_bytes());
        buf.extend_from_slice(&(self.attachment.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.attachment);
        buf
    }

    /// Computes the transaction id from the current field values.
    pub fn compute_id(&self) -> u64 {
        id_of(&self.signable_bytes())
    }

    /// Returns `true` if the transaction carries a signature.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Last chain timestamp at which the transaction may still be included.
    pub fn expiration(&self) -> u32 {
        self.timestamp
            .saturating_add(u32::from(self.deadline).saturating_mul(60))
    }

    /// Unsigned decimal rendering of the id, as block explorers show it.
    pub fn string_id(&self) -> String {
        self.id.to_string()
    }
}

/// Hex (de)serialization for attachment bytes, so snapshots stay readable.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for constructing unsigned [`Transaction`] instances.
///
/// # Usage
///
/// ```rust,no_run
/// use burst_protocol::crypto::keys::BurstKeypair;
/// use burst_protocol::storage::Block;
/// use burst_protocol::transaction::{TransactionBuilder, TransactionType};
///
/// let sender = BurstKeypair::generate();
/// let anchor = Block::genesis();
/// let tx = TransactionBuilder::new(TransactionType::Payment, sender.public_key())
///     .recipient(42)
///     .amount_nqt(50_000_000)
///     .fee_nqt(735_000)
///     .ec_anchor(&anchor)
///     .build();
/// ```
///
/// `timestamp` defaults to the current chain time and `deadline` to
/// [`DEFAULT_DEADLINE_MINUTES`]. Both can be overridden.
pub struct TransactionBuilder {
    tx_type: TransactionType,
    sender_public_key: BurstPublicKey,
    timestamp: Option<u32>,
    deadline: u16,
    recipient: Option<u64>,
    amount_nqt: u64,
    fee_nqt: u64,
    ec_block_height: u64,
    ec_block_id: u64,
    attachment: Vec<u8>,
}

impl TransactionBuilder {
    /// Creates a new builder for the given type and sender.
    pub fn new(tx_type: TransactionType, sender_public_key: BurstPublicKey) -> Self {
        Self {
            tx_type,
            sender_public_key,
            timestamp: None,
            deadline: DEFAULT_DEADLINE_MINUTES,
            recipient: None,
            amount_nqt: 0,
            fee_nqt: 0,
            ec_block_height: 0,
            ec_block_id: 0,
            attachment: Vec::new(),
        }
    }

    /// Sets the timestamp explicitly (seconds since the chain epoch).
    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the deadline in minutes.
    pub fn deadline(mut self, minutes: u16) -> Self {
        self.deadline = minutes;
        self
    }

    /// Sets the recipient account id.
    pub fn recipient(mut self, account_id: u64) -> Self {
        self.recipient = Some(account_id);
        self
    }

    /// Sets the transferred amount in NQT.
    pub fn amount_nqt(mut self, amount: u64) -> Self {
        self.amount_nqt = amount;
        self
    }

    /// Sets the fee in NQT.
    pub fn fee_nqt(mut self, fee: u64) -> Self {
        self.fee_nqt = fee;
        self
    }

    /// Commits the transaction to an EC anchor block, usually the output of
    /// `AnchorSelector::select_anchor` for this transaction's timestamp.
    pub fn ec_anchor(mut self, anchor: &Block) -> Self {
        self.ec_block_height = anchor.height;
        self.ec_block_id = anchor.id;
        self
    }

    /// Sets the anchor fields directly. Mostly useful for crafting bad
    /// transactions in tests.
    pub fn ec_block(mut self, height: u64, id: u64) -> Self {
        self.ec_block_height = height;
        self.ec_block_id = id;
        self
    }

    /// Attaches an opaque payload.
    pub fn attachment(mut self, data: Vec<u8>) -> Self {
        self.attachment = data;
        self
    }

    /// Consumes the builder and produces an unsigned [`Transaction`].
    pub fn build(self) -> Transaction {
        let mut tx = Transaction {
            id: 0,
            version: TRANSACTION_VERSION,
            tx_type: self.tx_type,
            timestamp: self.timestamp.unwrap_or_else(current_epoch_time),
            deadline: self.deadline,
            sender_public_key: self.sender_public_key,
            recipient: self.recipient,
            amount_nqt: self.amount_nqt,
            fee_nqt: self.fee_nqt,
            ec_block_height: self.ec_block_height,
            ec_block_id: self.ec_block_id,
            attachment: self.attachment,
            signature: None,
        };
        tx.id = tx.compute_id();
        tx
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
