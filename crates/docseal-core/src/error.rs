//! Error types for docseal core.

use thiserror::Error;

/// Failures raised by the leaf services for malformed or unusable input.
///
/// A cryptographic mismatch is never one of these: signature and digest
/// comparisons return `bool`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O failure while reading content: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("signature verification could not run: {0}")]
    VerificationFailure(String),

    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("malformed verification payload: {0}")]
    MalformedPayload(String),

    #[error("malformed signature record: {0}")]
    MalformedRecord(String),

    #[error("malformed digest: {0}")]
    MalformedDigest(String),

    #[error("encoding error: {0}")]
    EncodingError(String),
}

/// Input validation errors, raised before any cryptographic work.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("document is empty")]
    EmptyDocument,

    #[error("document is {size} bytes, exceeding the limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("document format is not accepted (expected one of: {expected})")]
    UnsupportedFormat { expected: String },
}
