//! # Key Management
//!
//! Ed25519 keypairs for block generators and transaction senders.
//!
//! Every forged block and every transaction carries a 32-byte public key and
//! a 64-byte signature produced by one of these keypairs. This module handles
//! creation, hex serialization, and verification.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (thanks, ed25519-dalek).
//! - Key generation uses `OsRng`.
//! - Key bytes are never logged. `Debug` prints the public half only.

use std::fmt;
use std::hash::{Hash, Hasher};

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during key operations.
///
/// Intentionally vague about *why* something failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or malformed hex")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a 32-byte Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid signature bytes: expected 64 bytes")]
    InvalidSignature,
}

/// An Ed25519 keypair.
///
/// Deliberately not `Serialize`: exporting a secret key should be an explicit
/// call to [`BurstKeypair::secret_key_bytes`], never a side effect of dumping
/// a struct to JSON.
///
/// # Examples
///
/// ```
/// use burst_protocol::crypto::keys::BurstKeypair;
///
/// let kp = BurstKeypair::generate();
/// let sig = kp.sign(b"forge");
/// assert!(kp.public_key().verify(b"forge", &sig));
/// ```
pub struct BurstKeypair {
    signing_key: SigningKey,
}

/// The public half of a keypair. Serialized as a 64-char hex string.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BurstPublicKey {
    bytes: [u8; 32],
}

/// A detached Ed25519 signature. Serialized as a 128-char hex string.
///
/// Always exactly 64 bytes; the constructors refuse anything else, so
/// verification never has to worry about odd lengths.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BurstSignature {
    bytes: [u8; 64],
}

// ---------------------------------------------------------------------------
// BurstKeypair
// ---------------------------------------------------------------------------

impl BurstKeypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Constructs a keypair deterministically from a 32-byte seed.
    ///
    /// Handy for tests and for passphrase-derived forging keys. A weak seed
    /// gives a weak key.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from a hex-encoded secret key.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// Returns the public key associated with this keypair.
    pub fn public_key(&self) -> BurstPublicKey {
        BurstPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> BurstSignature {
        BurstSignature {
            bytes: self.signing_key.sign(message).to_bytes(),
        }
    }

    /// Exports the raw 32-byte secret key material. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Clone for BurstKeypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for BurstKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BurstKeypair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// BurstPublicKey
// ---------------------------------------------------------------------------

impl BurstPublicKey {
    /// Create a public key from raw bytes. No curve check; use
    /// [`try_from_slice`](Self::try_from_slice) for untrusted input.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Create a public key from a slice, validating length and curve point.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Verify a signature against this public key.
    ///
    /// A boolean rather than a `Result`: callers on the validation path only
    /// want yes or no, and an invalid point is simply a "no".
    pub fn verify(&self, message: &[u8], signature: &BurstSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let dalek_sig = DalekSignature::from_bytes(&signature.bytes);
        verifying_key.verify(message, &dalek_sig).is_ok()
    }

    /// Hex-encoded representation. 64 characters for 32 bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse a hex-encoded public key string.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }
}

impl Hash for BurstPublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for BurstPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for BurstPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BurstPublicKey({})", &self.to_hex()[..16])
    }
}

impl TryFrom<String> for BurstPublicKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<BurstPublicKey> for String {
    fn from(value: BurstPublicKey) -> Self {
        value.to_hex()
    }
}

// ---------------------------------------------------------------------------
// BurstSignature
// ---------------------------------------------------------------------------

impl BurstSignature {
    /// Create a signature from its raw 64-byte representation.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self { bytes }
    }

    /// Returns the raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.bytes
    }

    /// Returns the hex-encoded signature string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse a hex-encoded signature.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidSignature)?;
        let bytes: [u8; 64] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSignature)?;
        Ok(Self { bytes })
    }
}

impl fmt::Display for BurstSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for BurstSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        write!(f, "BurstSignature({}...{})", &hex_str[..8], &hex_str[120..])
    }
}

impl TryFrom<String> for BurstSignature {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<BurstSignature> for String {
    fn from(value: BurstSignature) -> Self {
        value.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_sign_verify_roundtrip() {
        let kp = BurstKeypair::generate();
        let msg = b"forge block 995";
        let sig = kp.sign(msg);
        assert!(kp.public_key().verify(msg, &sig));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let kp = BurstKeypair::generate();
        let sig = kp.sign(b"correct message");
        assert!(!kp.public_key().verify(b"wrong message", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = BurstKeypair::generate();
        let kp2 = BurstKeypair::generate();
        let sig = kp1.sign(b"message");
        assert!(!kp2.public_key().verify(b"message", &sig));
    }

    #[test]
    fn deterministic_from_seed() {
        let seed = [42u8; 32];
        assert_eq!(
            BurstKeypair::from_seed(&seed).public_key(),
            BurstKeypair::from_seed(&seed).public_key()
        );
    }

    #[test]
    fn secret_hex_roundtrip() {
        let kp = BurstKeypair::generate();
        let restored = BurstKeypair::from_hex(&hex::encode(kp.secret_key_bytes())).unwrap();
        assert_eq!(kp.public_key(), restored.public_key());
    }

    #[test]
    fn invalid_secret_hex_rejected() {
        assert_eq!(
            BurstKeypair::from_hex("deadbeef").unwrap_err(),
            KeyError::InvalidSecretKey
        );
        assert!(BurstKeypair::from_hex("not-hex-at-all").is_err());
    }

    #[test]
    fn public_key_rejects_wrong_length() {
        assert!(BurstPublicKey::try_from_slice(&[0u8; 16]).is_err());
        assert!(BurstPublicKey::from_hex("abcd").is_err());
    }

    #[test]
    fn public_key_serializes_as_hex_string() {
        let pk = BurstKeypair::from_seed(&[7u8; 32]).public_key();
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{}\"", pk.to_hex()));
        let recovered: BurstPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(pk, recovered);
    }

    #[test]
    fn signature_rejects_short_hex() {
        assert_eq!(
            BurstSignature::from_hex(&"ab".repeat(63)).unwrap_err(),
            KeyError::InvalidSignature
        );
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = BurstKeypair::generate();
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("BurstKeypair(pub="));
        assert!(!debug_str.contains(&hex::encode(kp.secret_key_bytes())));
    }
}
