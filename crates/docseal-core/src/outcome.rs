//! Verification outcomes and their classification.
//!
//! Classification priority: artifact and signature authenticity dominate
//! content match. A forged artifact is `Invalid` even when the content also
//! changed, so it is never understated as a mere modification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::unix_now;

/// The four terminal verification classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationStatus {
    /// Artifact genuine, signature valid, content unchanged.
    #[serde(rename = "valid")]
    Valid,
    /// Artifact genuine and signature valid, but the presented content differs.
    #[serde(rename = "modified")]
    ContentModified,
    /// Signature incorrect or artifact forged.
    #[serde(rename = "invalid")]
    Invalid,
    /// No verdict could be rendered.
    #[serde(rename = "error")]
    Error,
}

impl VerificationStatus {
    /// Classify from the three sub-checks.
    pub fn classify(payload_valid: bool, signature_valid: bool, hash_matches: bool) -> Self {
        if !payload_valid || !signature_valid {
            VerificationStatus::Invalid
        } else if !hash_matches {
            VerificationStatus::ContentModified
        } else {
            VerificationStatus::Valid
        }
    }

    /// Wire name used by the verification report.
    pub const fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Valid => "valid",
            VerificationStatus::ContentModified => "modified",
            VerificationStatus::Invalid => "invalid",
            VerificationStatus::Error => "error",
        }
    }

    /// Human-readable message for presentation layers.
    pub const fn message(&self) -> &'static str {
        match self {
            VerificationStatus::Valid => "Document is authentic and unmodified.",
            VerificationStatus::ContentModified => {
                "Verification artifact is genuine, but the document content has been altered."
            }
            VerificationStatus::Invalid => "Signature incorrect or verification artifact forged.",
            VerificationStatus::Error => "The document could not be verified.",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Results of the individual checks. `None` means the check never ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDetails {
    pub payload_valid: Option<bool>,
    pub hash_matches: Option<bool>,
    pub signature_valid: Option<bool>,
}

/// The write-once result of one verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    /// The document id as presented by the caller.
    pub document_id: String,
    pub status: VerificationStatus,
    pub details: CheckDetails,
    /// Why no verdict was reached, for `Error` outcomes.
    pub reason: Option<String>,
    /// Unix seconds.
    pub verified_at: i64,
}

impl VerificationOutcome {
    /// An outcome for a completed set of checks.
    pub fn verdict(
        document_id: impl Into<String>,
        payload_valid: bool,
        signature_valid: bool,
        hash_matches: bool,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            status: VerificationStatus::classify(payload_valid, signature_valid, hash_matches),
            details: CheckDetails {
                payload_valid: Some(payload_valid),
                hash_matches: Some(hash_matches),
                signature_valid: Some(signature_valid),
            },
            reason: None,
            verified_at: unix_now(),
        }
    }

    /// An `Error` outcome carrying whatever checks had already run.
    pub fn error(
        document_id: impl Into<String>,
        details: CheckDetails,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            status: VerificationStatus::Error,
            details,
            reason: Some(reason.into()),
            verified_at: unix_now(),
        }
    }

    /// The serializable report handed to presentation layers.
    pub fn report(&self) -> VerificationReport {
        VerificationReport {
            status: self.status,
            message: self.status.message().to_string(),
            details: self.details,
            reason: self.reason.clone(),
            document_id: self.document_id.clone(),
            verified_at: self.verified_at,
        }
    }
}

/// Report shape consumed by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub status: VerificationStatus,
    pub message: String,
    pub details: CheckDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub document_id: String,
    pub verified_at: i64,
}
