//! Ed25519 key material with strong types.
//!
//! A [`KeyPair`] is immutable once constructed. Rotation produces a new
//! value; nothing here mutates key bytes in place.

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest as _, Sha256};

use crate::error::CoreError;

/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Parse raw public key bytes. Rejects encodings that are not a valid
    /// curve point.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CoreError> {
        VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| CoreError::InvalidKeyMaterial("not a valid Ed25519 public key".into()))
    }

    /// Get the raw bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_bytes())
    }

    /// SHA-256 hex fingerprint of the raw public key. Safe to log.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }

    /// Verify a signature over a message.
    ///
    /// Returns `Ok(false)` on a cryptographic mismatch; errors only when the
    /// signature bytes cannot be a signature at all.
    pub fn verify_message(&self, message: &[u8], signature: &[u8]) -> Result<bool, CoreError> {
        let bytes: [u8; SIGNATURE_LEN] = signature.try_into().map_err(|_| {
            CoreError::VerificationFailure(format!(
                "signature must be {} bytes, got {}",
                SIGNATURE_LEN,
                signature.len()
            ))
        })?;
        let sig = Signature::from_bytes(&bytes);
        Ok(self.0.verify(message, &sig).is_ok())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}...)", &self.to_hex()[..16])
    }
}

/// An Ed25519 signing key pair.
///
/// Wraps ed25519-dalek's `SigningKey`. `Debug` prints the public half only.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key())
    }

    /// Fingerprint of the public key.
    pub fn fingerprint(&self) -> String {
        self.public_key().fingerprint()
    }

    /// Get the raw seed bytes (secret key material).
    pub fn seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Sign a message.
    pub(crate) fn sign_message(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair({:?})", self.public_key())
    }
}
