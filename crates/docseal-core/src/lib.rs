//! # Docseal Core
//!
//! Pure primitives for the docseal integrity engine: content digests,
//! digest signatures, the portable verification payload, and outcome
//! classification.
//!
//! This crate performs no storage and no networking. The only I/O it knows
//! about is `std::io::Read`, for streamed digests.
//!
//! ## Key Types
//!
//! - [`Digest`] - 32-byte SHA-256 fingerprint of a document
//! - [`KeyPair`] / [`PublicKey`] - Ed25519 key material
//! - [`SignatureRecord`] - A signature bound to the digest it was computed over
//! - [`VerificationPayload`] - The self-contained record carried by the QR artifact
//! - [`VerificationStatus`] - The four terminal verification classifications
//!
//! ## Capabilities
//!
//! Hashing, signing and payload coding sit behind the [`ContentHasher`],
//! [`SignatureService`] and [`PayloadCodec`] traits. Each has exactly one
//! production implementation; tests substitute fakes.

pub mod crypto;
pub mod digest;
pub mod error;
pub mod outcome;
pub mod payload;
pub mod signature;
pub mod types;
pub mod validation;

pub use crypto::{KeyPair, PublicKey, SIGNATURE_LEN};
pub use digest::{constant_time_eq, ContentHasher, Digest, Sha256Hasher, DIGEST_LEN};
pub use error::{CoreError, ValidationError};
pub use outcome::{CheckDetails, VerificationOutcome, VerificationReport, VerificationStatus};
pub use payload::{JsonPayloadCodec, PayloadCodec, VerificationPayload};
pub use signature::{Ed25519Signer, SignatureAlgorithm, SignatureRecord, SignatureService};
pub use types::{DocumentId, DocumentStatus, PersistedDocument};
pub use validation::{validate_document, DocumentFormat, DocumentPolicy};

/// Current Unix time in whole seconds.
pub fn unix_now() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
