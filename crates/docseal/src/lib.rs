//! # Docseal
//!
//! Document integrity and verification engine: fingerprint a document, sign
//! the fingerprint, hand out a portable verification payload, and later decide
//! whether a presented copy is authentic, modified or forged.
//!
//! ## Overview
//!
//! - **Signing**: validate → digest → sign → build payload → persist → embed.
//!   See [`SigningPipeline`].
//! - **Verification**: fetch → decode → digest → check payload → check
//!   signature → compare digests → classify → audit. See
//!   [`VerificationEngine`].
//!
//! Verification never fails with an error. Every attempt produces one of
//! `Valid`, `ContentModified`, `Invalid` or `Error`, and one audit entry.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docseal::{Engine, EngineConfig, SigningRequest, VerifierContext};
//! use docseal::keys::{FileKeySource, KeyMaterialProvider};
//! use docseal::store::SqliteStore;
//!
//! async fn example() {
//!     let config = EngineConfig::default();
//!     let keys = KeyMaterialProvider::load_or_generate(
//!         Box::new(FileKeySource::new(&config.key_dir)),
//!         config.key_size_bits,
//!     )
//!     .unwrap();
//!     let store = SqliteStore::open(&config.database_path).unwrap();
//!     let engine = Engine::new(keys, store, config);
//!
//!     let pdf = std::fs::read("transcript.pdf").unwrap();
//!     let signed = engine.sign(SigningRequest::new(pdf.clone())).await.unwrap();
//!
//!     let outcome = engine
//!         .verify(&signed.document_id.to_string(), &pdf, &VerifierContext::new())
//!         .await;
//!     println!("{}", outcome.status);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `docseal::core` - Digests, signatures, payloads, outcomes
//! - `docseal::keys` - Key sources and the key material provider
//! - `docseal::store` - Document store, audit sink, SQLite

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod services;
pub mod signing;
pub mod verification;

// Re-export component crates
pub use docseal_core as core;
pub use docseal_keys as keys;
pub use docseal_store as store;

// Re-export main types for convenience
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, Result, SigningStage};
pub use services::Services;
pub use signing::{NoopEmbedder, PayloadEmbedder, SignedDocument, SigningPipeline, SigningRequest};
pub use verification::{VerificationEngine, VerifierContext};

// Re-export commonly used core types
pub use docseal_core::{
    CheckDetails, Digest, DocumentId, DocumentStatus, VerificationOutcome, VerificationReport,
    VerificationStatus,
};
