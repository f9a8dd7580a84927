//! Strong type definitions for docseal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// A globally unique document identifier (UUID v4).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Assign a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse the hyphenated (or simple) textual form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s.trim()).map(Self)
    }

    /// Get the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Lifecycle status of a persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Signed and verifiable.
    Active,
    /// Withdrawn by an operator. Terminal; never verifiable again.
    Withdrawn,
}

impl DocumentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Active => "active",
            DocumentStatus::Withdrawn => "withdrawn",
        }
    }

    pub const fn is_verifiable(&self) -> bool {
        matches!(self, DocumentStatus::Active)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(DocumentStatus::Active),
            "withdrawn" => Ok(DocumentStatus::Withdrawn),
            other => Err(CoreError::MalformedRecord(format!(
                "unknown document status: {}",
                other
            ))),
        }
    }
}

/// The fields of a signed document that the engine reads and writes.
///
/// Created once at signing time. Only `status` may change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedDocument {
    pub id: DocumentId,
    /// Lowercase hex of the document digest.
    pub digest_encoded: String,
    /// Stored [`SignatureRecord`](crate::SignatureRecord) encoding.
    pub signature_record_encoded: String,
    /// The encoded [`VerificationPayload`](crate::VerificationPayload).
    pub verification_payload_encoded: String,
    pub status: DocumentStatus,
    /// Unix seconds.
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_roundtrip() {
        let id = DocumentId::new();
        let recovered = DocumentId::parse(&id.to_string()).unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_document_ids_unique() {
        assert_ne!(DocumentId::new(), DocumentId::new());
    }

    #[test]
    fn test_document_id_rejects_garbage() {
        assert!(DocumentId::parse("../../etc/passwd").is_err());
        assert!(DocumentId::parse("").is_err());
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [DocumentStatus::Active, DocumentStatus::Withdrawn] {
            assert_eq!(status.as_str().parse::<DocumentStatus>().unwrap(), status);
        }
        assert!("deleted".parse::<DocumentStatus>().is_err());
        assert!(!DocumentStatus::Withdrawn.is_verifiable());
    }
}
