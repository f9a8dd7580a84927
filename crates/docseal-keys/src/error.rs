//! Error types for key material handling.
//!
//! Messages never contain key bytes.

use thiserror::Error;

/// Errors that can occur while loading, generating or rotating keys.
#[derive(Debug, Error)]
pub enum KeyError {
    /// No key material at the source.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Material present but unusable.
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Requested strength below the floor.
    #[error("requested key size {requested} bits is below the minimum of {minimum} bits")]
    KeyTooSmall { requested: u32, minimum: u32 },

    /// Requested strength this key type cannot provide.
    #[error("requested key size {requested} bits exceeds the supported maximum of {maximum} bits")]
    UnsupportedKeySize { requested: u32, maximum: u32 },

    /// The source cannot be written.
    #[error("key source is read-only: {0}")]
    ReadOnlySource(&'static str),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A thread panicked while holding the key lock.
    #[error("key material lock poisoned")]
    LockPoisoned,
}

/// Result type for key operations.
pub type Result<T> = std::result::Result<T, KeyError>;
