//! Structured audit logging.
//!
//! Every signing and verification attempt emits one `tracing` event with an
//! `event_type` field, suitable for shipping to a log pipeline. Key material
//! never appears in these events; keys are identified by fingerprint.

use docseal_core::{DocumentId, VerificationOutcome, VerificationStatus};

use crate::error::{EngineError, SigningStage};
use crate::verification::VerifierContext;

/// Event types.
pub mod events {
    /// A document was signed and persisted.
    pub const DOCUMENT_SIGNED: &str = "document.signed";
    /// The signing pipeline failed.
    pub const DOCUMENT_SIGN_FAILED: &str = "document.sign_failed";
    /// A document was withdrawn.
    pub const DOCUMENT_WITHDRAWN: &str = "document.withdrawn";

    pub const VERIFICATION_VALID: &str = "verification.valid";
    pub const VERIFICATION_MODIFIED: &str = "verification.modified";
    pub const VERIFICATION_INVALID: &str = "verification.invalid";
    pub const VERIFICATION_ERROR: &str = "verification.error";

    /// The audit sink could not record an attempt.
    pub const AUDIT_SINK_FAILED: &str = "audit.sink_failed";
}

/// Event type for a verification status.
pub const fn verification_event(status: VerificationStatus) -> &'static str {
    match status {
        VerificationStatus::Valid => events::VERIFICATION_VALID,
        VerificationStatus::ContentModified => events::VERIFICATION_MODIFIED,
        VerificationStatus::Invalid => events::VERIFICATION_INVALID,
        VerificationStatus::Error => events::VERIFICATION_ERROR,
    }
}

pub fn log_document_signed(id: &DocumentId, digest_hex: &str, key_fingerprint: &str) {
    tracing::info!(
        event_type = events::DOCUMENT_SIGNED,
        document_id = %id,
        digest = %digest_hex,
        key_fingerprint = %key_fingerprint,
        "Document signed"
    );
}

pub fn log_sign_failed(error: &EngineError) {
    let stage = error.stage().map(SigningStage::as_str).unwrap_or("unknown");
    if error.is_invalid_input() {
        tracing::warn!(
            event_type = events::DOCUMENT_SIGN_FAILED,
            stage,
            error = %error.root(),
            "Document rejected"
        );
    } else {
        tracing::error!(
            event_type = events::DOCUMENT_SIGN_FAILED,
            stage,
            error = %error.root(),
            "Document signing failed"
        );
    }
}

pub fn log_document_withdrawn(id: &DocumentId) {
    tracing::warn!(
        event_type = events::DOCUMENT_WITHDRAWN,
        document_id = %id,
        "Document withdrawn"
    );
}

/// Log the outcome of one verification attempt.
pub fn log_verification(outcome: &VerificationOutcome, ctx: &VerifierContext) {
    let event_type = verification_event(outcome.status);
    let client_ip = ctx.client_ip.as_deref().unwrap_or("<unknown>");
    let d = &outcome.details;

    match outcome.status {
        VerificationStatus::Valid => tracing::info!(
            event_type,
            document_id = %outcome.document_id,
            client_ip,
            "Verification passed"
        ),
        VerificationStatus::ContentModified | VerificationStatus::Invalid => tracing::warn!(
            event_type,
            document_id = %outcome.document_id,
            client_ip,
            payload_valid = ?d.payload_valid,
            signature_valid = ?d.signature_valid,
            hash_matches = ?d.hash_matches,
            "Verification failed"
        ),
        VerificationStatus::Error => tracing::warn!(
            event_type,
            document_id = %outcome.document_id,
            client_ip,
            reason = outcome.reason.as_deref().unwrap_or(""),
            "Verification could not complete"
        ),
    }
}

pub fn log_audit_sink_failed(document_id: &str, error: &dyn std::error::Error) {
    tracing::error!(
        event_type = events::AUDIT_SINK_FAILED,
        document_id = %document_id,
        error = %error,
        "Failed to record verification audit entry"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(
            verification_event(VerificationStatus::ContentModified),
            "verification.modified"
        );
        assert_eq!(verification_event(VerificationStatus::Error), "verification.error");
    }

    #[test]
    fn test_sign_failure_names_stage() {
        let staged = EngineError::at(
            SigningStage::Persisting,
            EngineError::DocumentNotFound("4b1d".into()),
        );
        assert_eq!(staged.stage().map(SigningStage::as_str), Some("persisting"));

        log_sign_failed(&staged);
        log_sign_failed(&EngineError::Config("missing issuer".into()));
    }
}
