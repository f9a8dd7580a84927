//! Content digests.
//!
//! A [`Digest`] is the SHA-256 fingerprint of a document's canonical bytes.
//! It is a pure function of the content: no salt, no key, no randomness, so
//! any verifier holding the same bytes reproduces it.

use std::fmt;
use std::io::{ErrorKind, Read};

use sha2::{Digest as _, Sha256};
use subtle::ConstantTimeEq;

use crate::error::CoreError;

/// Length of a digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Read buffer size for streamed hashing.
const STREAM_CHUNK: usize = 64 * 1024;

/// A 32-byte SHA-256 document digest.
///
/// Deliberately not `PartialEq`: compare digests with [`Digest::ct_eq`].
#[derive(Clone, Copy, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, which must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; DIGEST_LEN] = bytes.try_into().map_err(|_| {
            CoreError::MalformedDigest(format!(
                "expected {} bytes, got {}",
                DIGEST_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Convert to lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex (either case).
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|e| CoreError::MalformedDigest(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Constant-time equality.
    pub fn ct_eq(&self, other: &Digest) -> bool {
        constant_time_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}...)", &self.to_hex()[..16])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

/// Compare two byte strings without an early exit on the first differing
/// byte. Only a length mismatch returns early; lengths are not secret.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes document digests.
pub trait ContentHasher: Send + Sync {
    /// Digest an in-memory document.
    fn digest(&self, content: &[u8]) -> Digest;

    /// Digest a document supplied as a stream.
    ///
    /// Must produce exactly the digest [`ContentHasher::digest`] would for the
    /// same bytes. Read errors are returned, never folded into a digest.
    fn digest_reader(&self, reader: &mut dyn Read) -> Result<Digest, CoreError>;
}

/// SHA-256 content hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn digest(&self, content: &[u8]) -> Digest {
        Digest(Sha256::digest(content).into())
    }

    fn digest_reader(&self, reader: &mut dyn Read) -> Result<Digest, CoreError> {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; STREAM_CHUNK];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => hasher.update(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(CoreError::Io(e)),
            }
        }
        Ok(Digest(hasher.finalize().into()))
    }
}
