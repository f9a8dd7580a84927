//! In-memory implementation of the store traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use docseal_core::{DocumentId, DocumentStatus, PersistedDocument};

use crate::error::{Result, StoreError};
use crate::traits::{AuditEntry, AuditSink, DocumentStore, InsertResult};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Documents indexed by id.
    documents: HashMap<DocumentId, PersistedDocument>,

    /// Audit entries in insertion order.
    audit: Vec<AuditEntry>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }

    /// Overwrite a stored document's fields. Test hook for simulating
    /// tampering or corruption at rest.
    pub fn replace_document(&self, document: PersistedDocument) -> Result<()> {
        self.write()?.documents.insert(document.id, document);
        Ok(())
    }

    /// Total audit entries across all documents.
    pub fn audit_len(&self) -> Result<usize> {
        Ok(self.read()?.audit.len())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_document(&self, document: &PersistedDocument) -> Result<InsertResult> {
        let mut inner = self.write()?;

        if inner.documents.contains_key(&document.id) {
            return Ok(InsertResult::AlreadyExists);
        }

        inner.documents.insert(document.id, document.clone());
        Ok(InsertResult::Inserted)
    }

    async fn get_document(&self, id: &DocumentId) -> Result<Option<PersistedDocument>> {
        Ok(self.read()?.documents.get(id).cloned())
    }

    async fn set_status(&self, id: &DocumentId, status: DocumentStatus) -> Result<()> {
        let mut inner = self.write()?;
        match inner.documents.get_mut(id) {
            Some(document) => {
                document.status = status;
                Ok(())
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    async fn count_documents(&self) -> Result<u64> {
        Ok(self.read()?.documents.len() as u64)
    }
}

#[async_trait]
impl AuditSink for MemoryStore {
    async fn record_verification(&self, entry: &AuditEntry) -> Result<()> {
        self.write()?.audit.push(entry.clone());
        Ok(())
    }

    async fn audit_entries(&self, document_id: &str) -> Result<Vec<AuditEntry>> {
        Ok(self
            .read()?
            .audit
            .iter()
            .filter(|e| e.document_id == document_id)
            .cloned()
            .collect())
    }
}
