//! The key material provider.
//!
//! Holds the current key pair behind an `RwLock<Arc<_>>`. Readers clone the
//! `Arc` and release the lock immediately, so a signing or verification
//! operation always sees one complete key pair even if a rotation lands
//! halfway through it.

use std::sync::{Arc, Mutex, RwLock};

use docseal_core::{KeyPair, PublicKey};

use crate::error::{KeyError, Result};
use crate::source::KeySource;

/// Weakest accepted strength, in RSA-equivalent bits.
pub const MIN_KEY_SIZE_BITS: u32 = 2048;

/// Strongest strength an Ed25519 key can claim, in RSA-equivalent bits.
pub const MAX_KEY_SIZE_BITS: u32 = 3072;

/// Check a requested strength against the supported range.
pub fn check_key_strength(bits: u32) -> Result<()> {
    if bits < MIN_KEY_SIZE_BITS {
        return Err(KeyError::KeyTooSmall {
            requested: bits,
            minimum: MIN_KEY_SIZE_BITS,
        });
    }
    if bits > MAX_KEY_SIZE_BITS {
        return Err(KeyError::UnsupportedKeySize {
            requested: bits,
            maximum: MAX_KEY_SIZE_BITS,
        });
    }
    Ok(())
}

/// Generate a fresh key pair of at least the requested strength.
pub fn generate(bits: u32) -> Result<KeyPair> {
    check_key_strength(bits)?;
    Ok(KeyPair::generate())
}

/// Owns the active key pair and its backing source.
pub struct KeyMaterialProvider {
    source: Box<dyn KeySource>,
    current: RwLock<Arc<KeyPair>>,
    /// Serializes rotations so archive/store pairs never interleave.
    rotation: Mutex<()>,
}

impl KeyMaterialProvider {
    /// Load existing material from `source`. Fails if there is none.
    pub fn load(source: Box<dyn KeySource>) -> Result<Self> {
        let keypair = source.load()?;
        tracing::info!(
            source = %source.describe(),
            fingerprint = %keypair.fingerprint(),
            "loaded signing key"
        );
        Ok(Self::with_keypair(source, keypair))
    }

    /// Load existing material, or generate and persist a new key pair if the
    /// source is empty. Invalid material is an error, never replaced.
    pub fn load_or_generate(source: Box<dyn KeySource>, bits: u32) -> Result<Self> {
        match source.load() {
            Ok(keypair) => {
                tracing::info!(
                    source = %source.describe(),
                    fingerprint = %keypair.fingerprint(),
                    "loaded signing key"
                );
                Ok(Self::with_keypair(source, keypair))
            }
            Err(KeyError::KeyNotFound(_)) => {
                let keypair = generate(bits)?;
                source.store(&keypair)?;
                tracing::info!(
                    source = %source.describe(),
                    fingerprint = %keypair.fingerprint(),
                    bits,
                    "generated signing key"
                );
                Ok(Self::with_keypair(source, keypair))
            }
            Err(e) => Err(e),
        }
    }

    /// Wrap an already loaded key pair. Nothing is written to `source`.
    pub fn with_keypair(source: Box<dyn KeySource>, keypair: KeyPair) -> Self {
        Self {
            source,
            current: RwLock::new(Arc::new(keypair)),
            rotation: Mutex::new(()),
        }
    }

    /// Snapshot of the current key pair.
    pub fn current(&self) -> Result<Arc<KeyPair>> {
        self.current
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| KeyError::LockPoisoned)
    }

    /// The current public key.
    pub fn public_key(&self) -> Result<PublicKey> {
        Ok(self.current()?.public_key())
    }

    /// Replace the key pair with a newly generated one and return the
    /// previous pair.
    ///
    /// The strength check runs before anything is touched. The old material is
    /// archived at the source, the new material stored, and only then swapped
    /// in. If any step fails the in-memory key pair is unchanged and the
    /// source still holds the previous pair.
    pub fn rotate(&self, bits: u32) -> Result<Arc<KeyPair>> {
        let _guard = self.rotation.lock().map_err(|_| KeyError::LockPoisoned)?;

        let keypair = generate(bits)?;
        let previous = self.current()?;

        self.source.archive()?;
        if let Err(e) = self.source.store(&keypair) {
            tracing::warn!(
                source = %self.source.describe(),
                error = %e,
                "failed to store rotated key; in-memory key unchanged"
            );
            if !self.source_holds(&previous) {
                if let Err(restore) = self.source.store(&previous) {
                    tracing::error!(
                        source = %self.source.describe(),
                        fingerprint = %previous.fingerprint(),
                        error = %restore,
                        "could not restore previous signing key"
                    );
                }
            }
            return Err(e);
        }

        let fingerprint = keypair.fingerprint();
        *self.current.write().map_err(|_| KeyError::LockPoisoned)? = Arc::new(keypair);

        tracing::info!(
            source = %self.source.describe(),
            previous = %previous.fingerprint(),
            fingerprint = %fingerprint,
            bits,
            "rotated signing key"
        );
        Ok(previous)
    }

    fn source_holds(&self, keypair: &KeyPair) -> bool {
        self.source
            .load()
            .map_or(false, |loaded| loaded.public_key() == keypair.public_key())
    }
}

impl std::fmt::Debug for KeyMaterialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterialProvider")
            .field("source", &self.source.describe())
            .finish_non_exhaustive()
    }
}
