//! The substitutable cryptographic capabilities both pipelines use.

use std::sync::Arc;

use docseal_core::{
    ContentHasher, Ed25519Signer, JsonPayloadCodec, PayloadCodec, Sha256Hasher, SignatureService,
};

/// Hashing, signing and payload coding, each behind its trait.
///
/// `Default` wires the production implementations. Tests swap individual
/// capabilities for fakes.
#[derive(Clone)]
pub struct Services {
    pub hasher: Arc<dyn ContentHasher>,
    pub signer: Arc<dyn SignatureService>,
    pub codec: Arc<dyn PayloadCodec>,
}

impl Services {
    pub fn with_hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_signer(mut self, signer: Arc<dyn SignatureService>) -> Self {
        self.signer = signer;
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn PayloadCodec>) -> Self {
        self.codec = codec;
        self
    }
}

impl Default for Services {
    fn default() -> Self {
        Self {
            hasher: Arc::new(Sha256Hasher),
            signer: Arc::new(Ed25519Signer),
            codec: Arc::new(JsonPayloadCodec),
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
