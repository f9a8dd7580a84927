//! Input validation for documents submitted for signing.
//!
//! Runs before any cryptographic work. A rejected document never reaches
//! the digest stage.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default size ceiling: 10 MiB.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// Recognised document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    /// PDF, identified by its `%PDF-` header.
    Pdf,
    /// Any byte content.
    Any,
}

impl DocumentFormat {
    /// Whether `content` looks like this format.
    pub fn matches(&self, content: &[u8]) -> bool {
        match self {
            DocumentFormat::Pdf => content.starts_with(b"%PDF-"),
            DocumentFormat::Any => true,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Any => "any",
        }
    }
}

/// What the signing pipeline accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentPolicy {
    pub max_document_bytes: usize,
    pub accepted_formats: Vec<DocumentFormat>,
}

impl Default for DocumentPolicy {
    fn default() -> Self {
        Self {
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            accepted_formats: vec![DocumentFormat::Pdf],
        }
    }
}

impl DocumentPolicy {
    /// A policy accepting any non-empty content up to the default ceiling.
    pub fn any_format() -> Self {
        Self {
            accepted_formats: vec![DocumentFormat::Any],
            ..Self::default()
        }
    }
}

/// Validate a document against a policy.
///
/// Checks, in order: non-empty, size ceiling, accepted format.
pub fn validate_document(content: &[u8], policy: &DocumentPolicy) -> Result<(), ValidationError> {
    if content.is_empty() {
        return Err(ValidationError::EmptyDocument);
    }

    if content.len() > policy.max_document_bytes {
        return Err(ValidationError::TooLarge {
            size: content.len(),
            limit: policy.max_document_bytes,
        });
    }

    if !policy.accepted_formats.iter().any(|f| f.matches(content)) {
        let expected = policy
            .accepted_formats
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ValidationError::UnsupportedFormat { expected });
    }

    Ok(())
}
