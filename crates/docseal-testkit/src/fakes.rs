//! Fakes for the engine's collaborator traits.

use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use docseal::{EngineError, PayloadEmbedder};
use docseal_core::{
    ContentHasher, CoreError, Digest, DocumentId, DocumentStatus, PersistedDocument,
    Sha256Hasher,
};
use docseal_store::{AuditEntry, AuditSink, DocumentStore, InsertResult, StoreError};

/// SHA-256 hasher that counts how often it was asked for a digest.
#[derive(Debug, Default)]
pub struct CountingHasher {
    calls: AtomicUsize,
}

impl CountingHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ContentHasher for CountingHasher {
    fn digest(&self, content: &[u8]) -> Digest {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Sha256Hasher.digest(content)
    }

    fn digest_reader(&self, reader: &mut dyn Read) -> Result<Digest, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Sha256Hasher.digest_reader(reader)
    }
}

/// Audit sink that rejects every entry but counts the attempts.
#[derive(Debug, Default)]
pub struct FailingAuditSink {
    attempts: AtomicUsize,
}

impl FailingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn record_verification(&self, _entry: &AuditEntry) -> docseal_store::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::InvalidData("audit sink offline".into()))
    }

    async fn audit_entries(&self, _document_id: &str) -> docseal_store::Result<Vec<AuditEntry>> {
        Ok(Vec::new())
    }
}

/// Document store whose writes always fail.
#[derive(Debug, Default)]
pub struct FailingDocumentStore;

#[async_trait]
impl DocumentStore for FailingDocumentStore {
    async fn insert_document(
        &self,
        _document: &PersistedDocument,
    ) -> docseal_store::Result<InsertResult> {
        Err(StoreError::InvalidData("disk full".into()))
    }

    async fn get_document(
        &self,
        _id: &DocumentId,
    ) -> docseal_store::Result<Option<PersistedDocument>> {
        Err(StoreError::InvalidData("disk full".into()))
    }

    async fn set_status(&self, id: &DocumentId, _status: DocumentStatus) -> docseal_store::Result<()> {
        Err(StoreError::NotFound(id.to_string()))
    }

    async fn count_documents(&self) -> docseal_store::Result<u64> {
        Ok(0)
    }
}

/// Embedder that remembers what it was given, and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingEmbedder {
    fail: bool,
    calls: Mutex<Vec<(DocumentId, Vec<u8>)>>,
}

impl RecordingEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// An embedder that records the call and then fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<(DocumentId, Vec<u8>)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PayloadEmbedder for RecordingEmbedder {
    async fn embed(&self, document_id: &DocumentId, payload: &[u8]) -> docseal::Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((*document_id, payload.to_vec()));
        }
        if self.fail {
            return Err(EngineError::Embedding("renderer unavailable".into()));
        }
        Ok(())
    }
}
