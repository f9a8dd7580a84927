//! Store traits: the persistence and audit collaborators of the engine.
//!
//! The engine is storage-agnostic. Implementations include SQLite (primary)
//! and in-memory (for tests).

use async_trait::async_trait;
use docseal_core::{
    CheckDetails, DocumentId, DocumentStatus, PersistedDocument, VerificationOutcome,
    VerificationStatus,
};

use crate::error::Result;

/// Result of inserting a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// Document was inserted.
    Inserted,
    /// A document with this id already exists. Nothing was written.
    AlreadyExists,
}

/// One verification attempt, as recorded in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// The id as presented, which may not be a valid document id.
    pub document_id: String,
    pub status: VerificationStatus,
    pub details: CheckDetails,
    pub reason: Option<String>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    /// Unix seconds.
    pub verified_at: i64,
}

impl AuditEntry {
    /// Build an entry from an outcome and the caller's context.
    pub fn from_outcome(
        outcome: &VerificationOutcome,
        client_ip: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            document_id: outcome.document_id.clone(),
            status: outcome.status,
            details: outcome.details,
            reason: outcome.reason.clone(),
            client_ip,
            user_agent,
            verified_at: outcome.verified_at,
        }
    }
}

/// Async interface for document persistence.
///
/// Documents are immutable once inserted, except for `status`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document.
    ///
    /// # Returns
    /// - `Inserted` if the id was new.
    /// - `AlreadyExists` if a document with the same id is present.
    async fn insert_document(&self, document: &PersistedDocument) -> Result<InsertResult>;

    /// Get a document by id.
    async fn get_document(&self, id: &DocumentId) -> Result<Option<PersistedDocument>>;

    /// Change a document's status. Fails with `NotFound` for unknown ids.
    async fn set_status(&self, id: &DocumentId, status: DocumentStatus) -> Result<()>;

    /// Number of stored documents.
    async fn count_documents(&self) -> Result<u64>;
}

/// Async sink for verification audit entries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one entry.
    async fn record_verification(&self, entry: &AuditEntry) -> Result<()>;

    /// Entries recorded for a presented document id, oldest first.
    async fn audit_entries(&self, document_id: &str) -> Result<Vec<AuditEntry>>;
}
