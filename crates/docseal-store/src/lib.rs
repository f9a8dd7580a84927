//! # Docseal Store
//!
//! Persistence for signed documents and the verification audit trail.
//! Provides trait-based interfaces with SQLite and in-memory implementations.
//!
//! ## Key Types
//!
//! - [`DocumentStore`] - Async trait for document persistence
//! - [`AuditSink`] - Async trait for the verification audit trail
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`InsertResult`] - Result of inserting a document
//! - [`AuditEntry`] - One recorded verification attempt
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docseal_store::{DocumentStore, SqliteStore};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("docseal.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let count = store.count_documents().await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Write-once documents**: inserting an id that already exists returns
//!   `AlreadyExists` and leaves the stored row untouched. Only `status` is
//!   ever updated.
//! - **Audit is append-only**: entries are keyed by the id as presented, so
//!   lookups for unknown or malformed ids are recorded too.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{AuditEntry, AuditSink, DocumentStore, InsertResult};
