//! The portable verification payload carried by the QR artifact.
//!
//! The payload is a redundant, self-contained copy of the persisted record:
//! document id, digest and signature. Comparing it to the stored record
//! detects tampering with the artifact itself.
//!
//! Wire format is a flat JSON object. Unknown fields are ignored so older
//! scanners keep working when fields are added.

use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::error::CoreError;
use crate::signature::SignatureRecord;
use crate::types::DocumentId;

/// Data embedded in the verification artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationPayload {
    pub document_id: String,
    /// Hex digest of the signed document.
    pub hash: String,
    /// Algorithm-tagged base64 signature, e.g. `ed25519-sha256:...`.
    pub signature: String,
    /// Issuance time, Unix seconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_url: Option<String>,
}

impl VerificationPayload {
    /// Build a payload for a freshly signed document.
    pub fn new(document_id: &DocumentId, record: &SignatureRecord, issued_at: i64) -> Self {
        Self {
            document_id: document_id.to_string(),
            hash: record.digest.to_hex(),
            signature: record.tagged_signature(),
            timestamp: issued_at,
            issuer: None,
            verification_url: None,
        }
    }

    /// Set the issuer.
    pub fn issuer(mut self, issuer: Option<String>) -> Self {
        self.issuer = issuer;
        self
    }

    /// Set the verification URL.
    pub fn verification_url(mut self, url: Option<String>) -> Self {
        self.verification_url = url;
        self
    }

    /// Parse the embedded digest.
    pub fn digest(&self) -> Result<Digest, CoreError> {
        Digest::from_hex(&self.hash)
    }

    /// Structural checks beyond what serde enforces.
    fn check_structure(&self) -> Result<(), CoreError> {
        if self.document_id.trim().is_empty() {
            return Err(CoreError::MalformedPayload("document_id is empty".into()));
        }
        self.digest()
            .map_err(|e| CoreError::MalformedPayload(format!("hash: {}", e)))?;
        SignatureRecord::parse_tagged(&self.signature).map_err(|e| match e {
            CoreError::MalformedPayload(_) => e,
            other => CoreError::MalformedPayload(format!("signature: {}", other)),
        })?;
        Ok(())
    }
}

/// Serializes and deserializes verification payloads.
pub trait PayloadCodec: Send + Sync {
    /// Encode a payload to bytes.
    fn encode(&self, payload: &VerificationPayload) -> Result<Vec<u8>, CoreError>;

    /// Decode bytes into a payload, failing closed on anything malformed.
    fn decode(&self, bytes: &[u8]) -> Result<VerificationPayload, CoreError>;
}

/// JSON payload codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPayloadCodec;

impl PayloadCodec for JsonPayloadCodec {
    fn encode(&self, payload: &VerificationPayload) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(payload).map_err(|e| CoreError::EncodingError(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<VerificationPayload, CoreError> {
        let payload: VerificationPayload = serde_json::from_slice(bytes)
            .map_err(|e| CoreError::MalformedPayload(e.to_string()))?;
        payload.check_structure()?;
        Ok(payload)
    }
}
