//! Digest signatures.
//!
//! A [`SignatureRecord`] binds a signature to the exact digest it was
//! computed over and names its algorithm, so stored records stay
//! self-describing across algorithm migrations.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::crypto::{KeyPair, PublicKey};
use crate::digest::{constant_time_eq, Digest};
use crate::error::CoreError;

/// Domain separator prefixed to every signed message.
pub const SIGN_DOMAIN: &[u8] = b"docseal/digest-sig/v1";

/// Supported signature algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// Ed25519 over a SHA-256 document digest.
    Ed25519Sha256,
}

impl SignatureAlgorithm {
    /// The identifier recorded alongside signatures.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Ed25519Sha256 => "ed25519-sha256",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ed25519-sha256" => Ok(SignatureAlgorithm::Ed25519Sha256),
            other => Err(CoreError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// The message actually signed for a digest.
///
/// `SIGN_DOMAIN || 0x00 || algorithm || 0x00 || digest`
pub fn signed_message(algorithm: SignatureAlgorithm, digest: &Digest) -> Vec<u8> {
    let alg = algorithm.as_str().as_bytes();
    let mut msg = Vec::with_capacity(SIGN_DOMAIN.len() + alg.len() + 2 + digest.as_ref().len());
    msg.extend_from_slice(SIGN_DOMAIN);
    msg.push(0);
    msg.extend_from_slice(alg);
    msg.push(0);
    msg.extend_from_slice(digest.as_ref());
    msg
}

/// A signature together with the digest it covers.
#[derive(Clone)]
pub struct SignatureRecord {
    pub signature: Vec<u8>,
    pub digest: Digest,
    pub algorithm: SignatureAlgorithm,
}

/// Stored JSON shape of a [`SignatureRecord`].
#[derive(Serialize, Deserialize)]
struct StoredRecord {
    algorithm: String,
    signature: String,
    digest: String,
}

impl SignatureRecord {
    /// Encode for storage: base64 signature, base64 digest, explicit algorithm.
    pub fn encode(&self) -> Result<String, CoreError> {
        let stored = StoredRecord {
            algorithm: self.algorithm.as_str().to_string(),
            signature: BASE64.encode(&self.signature),
            digest: BASE64.encode(self.digest.as_ref()),
        };
        serde_json::to_string(&stored).map_err(|e| CoreError::EncodingError(e.to_string()))
    }

    /// Decode a stored record. Every field is required.
    pub fn decode(encoded: &str) -> Result<Self, CoreError> {
        let stored: StoredRecord = serde_json::from_str(encoded)
            .map_err(|e| CoreError::MalformedRecord(e.to_string()))?;
        let algorithm = stored.algorithm.parse()?;
        let signature = BASE64
            .decode(stored.signature.as_bytes())
            .map_err(|e| CoreError::MalformedRecord(format!("signature: {}", e)))?;
        let digest_bytes = BASE64
            .decode(stored.digest.as_bytes())
            .map_err(|e| CoreError::MalformedRecord(format!("digest: {}", e)))?;
        let digest = Digest::from_slice(&digest_bytes)
            .map_err(|e| CoreError::MalformedRecord(e.to_string()))?;
        Ok(Self {
            signature,
            digest,
            algorithm,
        })
    }

    /// The algorithm-tagged form used in verification payloads:
    /// `<algorithm>:<base64 signature>`.
    pub fn tagged_signature(&self) -> String {
        format!("{}:{}", self.algorithm, BASE64.encode(&self.signature))
    }

    /// Parse a tagged signature back into algorithm and raw bytes.
    pub fn parse_tagged(tagged: &str) -> Result<(SignatureAlgorithm, Vec<u8>), CoreError> {
        let (tag, body) = tagged
            .split_once(':')
            .ok_or_else(|| CoreError::MalformedPayload("signature has no algorithm tag".into()))?;
        let algorithm = tag.parse()?;
        let bytes = BASE64
            .decode(body.as_bytes())
            .map_err(|e| CoreError::MalformedPayload(format!("signature: {}", e)))?;
        Ok((algorithm, bytes))
    }

    /// Whether a tagged signature names this record's algorithm and bytes.
    pub fn matches_tagged(&self, tagged: &str) -> bool {
        match Self::parse_tagged(tagged) {
            Ok((algorithm, bytes)) => {
                algorithm == self.algorithm && constant_time_eq(&bytes, &self.signature)
            }
            Err(_) => false,
        }
    }
}

impl fmt::Debug for SignatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureRecord")
            .field("algorithm", &self.algorithm)
            .field("digest", &self.digest)
            .field("signature_len", &self.signature.len())
            .finish()
    }
}

/// Signs digests and verifies digest signatures.
pub trait SignatureService: Send + Sync {
    /// Sign a digest with the private half of `keypair`.
    fn sign(&self, digest: &Digest, keypair: &KeyPair) -> Result<SignatureRecord, CoreError>;

    /// Verify `record` over `digest` with `public_key`.
    ///
    /// A signature that does not match is `Ok(false)`. Errors are reserved
    /// for records that cannot be checked at all.
    fn verify(
        &self,
        digest: &Digest,
        record: &SignatureRecord,
        public_key: &PublicKey,
    ) -> Result<bool, CoreError>;
}

/// Ed25519 signature service.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Signer;

impl SignatureService for Ed25519Signer {
    fn sign(&self, digest: &Digest, keypair: &KeyPair) -> Result<SignatureRecord, CoreError> {
        let algorithm = SignatureAlgorithm::Ed25519Sha256;
        let message = signed_message(algorithm, digest);
        Ok(SignatureRecord {
            signature: keypair.sign_message(&message).to_vec(),
            digest: *digest,
            algorithm,
        })
    }

    fn verify(
        &self,
        digest: &Digest,
        record: &SignatureRecord,
        public_key: &PublicKey,
    ) -> Result<bool, CoreError> {
        match record.algorithm {
            SignatureAlgorithm::Ed25519Sha256 => {
                let message = signed_message(record.algorithm, digest);
                public_key.verify_message(&message, &record.signature)
            }
        }
    }
}
