//! # Addresses, Key Material, and Signatures
//!
//! Ed25519 identity types for the toolkit.
//!
//! An [`Address`] is a raw 32-byte public key, shown to the world as
//! base58. A [`Keypair`] wraps an `ed25519-dalek` signing key and travels
//! in external form as base64 of the 64-byte secret blob (seed followed by
//! the public key). A [`Signature`] is 64 bytes, with an all-zero
//! placeholder standing in for "not yet signed".
//!
//! ## Security considerations
//!
//! - Key material is decoded, used, and dropped within a single call.
//!   Nothing in this crate logs, persists, or echoes secret bytes.
//! - `Keypair` deliberately does not implement `Serialize`, `Deserialize`,
//!   or `Clone`. Serializing private keys should be a conscious act, not
//!   something that happens because a keypair ended up inside a JSON
//!   response. Use [`Keypair::to_base64`] explicitly.
//! - If you add logging to this module, you will be asked to leave.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;

use crate::config::{ADDRESS_LENGTH, SECRET_KEY_BLOB_LENGTH, SEED_LENGTH, SIGNATURE_LENGTH};
use crate::error::ToolError;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 32-byte account address — an Ed25519 public key in raw form.
///
/// Addresses are *not* validated as curve points. Program-derived addresses
/// are intentionally off-curve, so any 32 bytes is a legitimate address.
/// The only thing parsing enforces is the length.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Parses a base58 address string.
    ///
    /// Fails with [`ToolError::InvalidAddress`] when the input is not
    /// base58 or does not decode to exactly 32 bytes.
    pub fn from_base58(s: &str) -> Result<Self, ToolError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| ToolError::InvalidAddress(s.to_string()))?;
        let arr: [u8; ADDRESS_LENGTH] = bytes
            .try_into()
            .map_err(|_| ToolError::InvalidAddress(s.to_string()))?;
        Ok(Self(arr))
    }

    /// Wraps raw bytes as an address. No validation beyond the type-level
    /// length guarantee.
    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Base58 representation. This is what users see and paste.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// An Ed25519 keypair used to sign transactions.
///
/// The external form is base64 of the 64-byte secret blob: 32-byte seed
/// followed by the 32-byte public key. The redundant public half lets
/// [`from_base64`](Self::from_base64) detect corrupted or mixed-up key
/// material instead of silently deriving a different identity.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generates a fresh keypair from the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Decodes a keypair from the base64 64-byte secret blob.
    ///
    /// Validates both the length and that the embedded public half matches
    /// the key derived from the seed. Every failure mode collapses to
    /// [`ToolError::InvalidKeyMaterial`] — the error deliberately says
    /// nothing about what the bytes looked like.
    pub fn from_base64(encoded: &str) -> Result<Self, ToolError> {
        let blob = BASE64_STANDARD
            .decode(encoded)
            .map_err(|_| ToolError::InvalidKeyMaterial)?;
        if blob.len() != SECRET_KEY_BLOB_LENGTH {
            return Err(ToolError::InvalidKeyMaterial);
        }

        let mut seed = [0u8; SEED_LENGTH];
        seed.copy_from_slice(&blob[..SEED_LENGTH]);
        let signing_key = SigningKey::from_bytes(&seed);

        if signing_key.verifying_key().as_bytes() != &blob[SEED_LENGTH..] {
            return Err(ToolError::InvalidKeyMaterial);
        }

        Ok(Self { signing_key })
    }

    /// Encodes the 64-byte secret blob (seed then public key) as base64.
    ///
    /// **Handle with extreme care.** This string is full control over the
    /// associated identity. Print it for the user who asked for it and
    /// nowhere else.
    pub fn to_base64(&self) -> String {
        let mut blob = [0u8; SECRET_KEY_BLOB_LENGTH];
        blob[..SEED_LENGTH].copy_from_slice(&self.signing_key.to_bytes());
        blob[SEED_LENGTH..].copy_from_slice(self.signing_key.verifying_key().as_bytes());
        BASE64_STANDARD.encode(blob)
    }

    /// The address derived from this keypair's public key.
    pub fn address(&self) -> Address {
        Address(self.signing_key.verifying_key().to_bytes())
    }

    /// Signs a message. Ed25519 is deterministic, so the same (key, message)
    /// pair always produces the same signature.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret key material in debug output. Not even "partially."
        // A partial leak is still a leak, and grepping logs for base64 is trivial.
        write!(f, "Keypair(address={})", self.address())
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// An Ed25519 signature, or an all-zero placeholder for an unsigned slot.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// The all-zero placeholder that occupies a required-signer slot until
    /// the real signature arrives.
    pub fn placeholder() -> Self {
        Self([0u8; SIGNATURE_LENGTH])
    }

    /// Whether this slot still holds the placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.0 == [0u8; SIGNATURE_LENGTH]
    }

    /// Wraps raw 64-byte signature material.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// The raw 64 bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Base58 representation, the conventional display form for transaction
    /// signatures.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_placeholder() {
            return write!(f, "Signature(placeholder)");
        }
        let b58 = self.to_base58();
        write!(f, "Signature({}..{})", &b58[..6], &b58[b58.len() - 6..])
    }
}
