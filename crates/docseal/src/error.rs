//! Error types for the engine.

use std::fmt;

use docseal_core::{CoreError, DocumentId, ValidationError};
use docseal_keys::KeyError;
use docseal_store::StoreError;
use thiserror::Error;

/// Where in the signing pipeline a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningStage {
    Validating,
    Digesting,
    Signing,
    BuildingPayload,
    Persisting,
    Embedding,
}

impl SigningStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            SigningStage::Validating => "validating",
            SigningStage::Digesting => "digesting",
            SigningStage::Signing => "signing",
            SigningStage::BuildingPayload => "building_payload",
            SigningStage::Persisting => "persisting",
            SigningStage::Embedding => "embedding",
        }
    }
}

impl fmt::Display for SigningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during engine operations.
///
/// Verification never returns these for a completed attempt: every
/// verification failure becomes an `Error` outcome instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The document was rejected before any cryptographic work.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A core primitive failed.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Key material unavailable or unusable.
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The generated document id was already taken.
    #[error("document already exists: {0}")]
    DuplicateDocument(DocumentId),

    /// No document with this id.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// The embedding collaborator rejected the payload.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// Configuration could not be read.
    #[error("configuration error: {0}")]
    Config(String),

    /// A signing pipeline stage failed. Nothing after this stage ran.
    #[error("signing failed while {stage}: {source}")]
    Stage {
        stage: SigningStage,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Attribute an error to a signing stage.
    pub fn at(stage: SigningStage, source: impl Into<EngineError>) -> Self {
        EngineError::Stage {
            stage,
            source: Box::new(source.into()),
        }
    }

    /// The stage a signing failure happened in, if any.
    pub fn stage(&self) -> Option<SigningStage> {
        match self {
            EngineError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The underlying error with any stage wrapper removed.
    pub fn root(&self) -> &EngineError {
        match self {
            EngineError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the caller sent bad input, as opposed to a system failure.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self.root(), EngineError::Validation(_))
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_wrapping() {
        let err = EngineError::at(SigningStage::Validating, ValidationError::EmptyDocument);
        assert_eq!(err.stage(), Some(SigningStage::Validating));
        assert!(err.is_invalid_input());
        assert!(matches!(
            err.root(),
            EngineError::Validation(ValidationError::EmptyDocument)
        ));
        assert_eq!(
            err.to_string(),
            "signing failed while validating: invalid input: document is empty"
        );
    }

    #[test]
    fn test_store_failure_is_not_input_error() {
        let err = EngineError::at(
            SigningStage::Persisting,
            StoreError::NotFound("x".into()),
        );
        assert!(!err.is_invalid_input());
    }
}
