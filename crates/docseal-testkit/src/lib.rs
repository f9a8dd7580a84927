//! # Docseal Testkit
//!
//! Testing utilities for docseal.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known digests, signatures and key encodings that any
//!   independent verifier must reproduce
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: An engine over an in-memory store, plus tampering helpers
//! - **Fakes**: Counting and failing implementations of the engine's
//!   collaborator traits
//!
//! ## Golden Vectors
//!
//! ```rust
//! use docseal_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok) in verify_all_vectors() {
//!     assert!(ok, "{} does not reproduce", name);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use docseal_testkit::generators::SignedParams;
//!
//! proptest! {
//!     #[test]
//!     fn signatures_are_deterministic(params: SignedParams) {
//!         prop_assert_eq!(params.sign().signature, params.sign().signature);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use docseal_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let signed = fixture.sign(b"%PDF-1.7 ...").await;
//! let outcome = fixture.verify(&signed.document_id, b"%PDF-1.7 ...").await;
//! ```

pub mod fakes;
pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fakes::{CountingHasher, FailingAuditSink, FailingDocumentStore, RecordingEmbedder};
pub use fixtures::{multi_party_fixtures, sample_pdf, TestFixture};
pub use generators::SignedParams;
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
