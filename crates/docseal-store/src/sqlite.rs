//! SQLite implementation of the store traits.
//!
//! This is the primary storage backend. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use docseal_core::{
    CheckDetails, DocumentId, DocumentStatus, PersistedDocument, VerificationStatus,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{AuditEntry, AuditSink, DocumentStore, InsertResult};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
#[derive(Clone)]
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "opening document store");
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking closure against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn conversion_error(
    column: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
}

// Helper to convert a row to PersistedDocument
fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<PersistedDocument> {
    let id: String = row.get("document_id")?;
    let status: String = row.get("status")?;

    Ok(PersistedDocument {
        id: DocumentId::parse(&id).map_err(|e| conversion_error(0, e))?,
        digest_encoded: row.get("digest")?,
        signature_record_encoded: row.get("signature_record")?,
        verification_payload_encoded: row.get("verification_payload")?,
        status: status
            .parse::<DocumentStatus>()
            .map_err(|e| conversion_error(4, e))?,
        created_at: row.get("created_at")?,
    })
}

// Helper to convert a row to AuditEntry
fn row_to_audit(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntry> {
    let status: String = row.get("status")?;
    let status = match status.as_str() {
        "valid" => VerificationStatus::Valid,
        "modified" => VerificationStatus::ContentModified,
        "invalid" => VerificationStatus::Invalid,
        "error" => VerificationStatus::Error,
        other => {
            return Err(conversion_error(
                1,
                StoreError::InvalidData(format!("unknown verification status: {}", other)),
            ))
        }
    };

    Ok(AuditEntry {
        document_id: row.get("document_id")?,
        status,
        details: CheckDetails {
            payload_valid: row.get("payload_valid")?,
            hash_matches: row.get("hash_matches")?,
            signature_valid: row.get("signature_valid")?,
        },
        reason: row.get("reason")?,
        client_ip: row.get("client_ip")?,
        user_agent: row.get("user_agent")?,
        verified_at: row.get("verified_at")?,
    })
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert_document(&self, document: &PersistedDocument) -> Result<InsertResult> {
        let document = document.clone();

        self.with_conn(move |conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO documents (
                    document_id, digest, signature_record, verification_payload,
                    status, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    document.id.to_string(),
                    document.digest_encoded,
                    document.signature_record_encoded,
                    document.verification_payload_encoded,
                    document.status.as_str(),
                    document.created_at,
                ],
            )?;

            if changed == 0 {
                Ok(InsertResult::AlreadyExists)
            } else {
                Ok(InsertResult::Inserted)
            }
        })
        .await
    }

    async fn get_document(&self, id: &DocumentId) -> Result<Option<PersistedDocument>> {
        let id = id.to_string();

        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT document_id, digest, signature_record, verification_payload,
                        status, created_at
                 FROM documents WHERE document_id = ?1",
                params![id],
                row_to_document,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn set_status(&self, id: &DocumentId, status: DocumentStatus) -> Result<()> {
        let id = id.to_string();

        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE documents SET status = ?1 WHERE document_id = ?2",
                params![status.as_str(), id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn count_documents(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}

#[async_trait]
impl AuditSink for SqliteStore {
    async fn record_verification(&self, entry: &AuditEntry) -> Result<()> {
        let entry = entry.clone();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO verification_audit (
                    document_id, status, payload_valid, hash_matches, signature_valid,
                    reason, client_ip, user_agent, verified_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    entry.document_id,
                    entry.status.as_str(),
                    entry.details.payload_valid,
                    entry.details.hash_matches,
                    entry.details.signature_valid,
                    entry.reason,
                    entry.client_ip,
                    entry.user_agent,
                    entry.verified_at,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn audit_entries(&self, document_id: &str) -> Result<Vec<AuditEntry>> {
        let document_id = document_id.to_string();

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT document_id, status, payload_valid, hash_matches, signature_valid,
                        reason, client_ip, user_agent, verified_at
                 FROM verification_audit WHERE document_id = ?1 ORDER BY id",
            )?;
            let entries = stmt
                .query_map(params![document_id], row_to_audit)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(entries)
        })
        .await
    }
}
