//! The Engine: signing and verification over one store and one key provider.

use std::io::Read;
use std::sync::Arc;

use docseal_core::{DocumentId, DocumentStatus, PublicKey, VerificationOutcome};
use docseal_keys::KeyMaterialProvider;
use docseal_store::{AuditEntry, AuditSink, DocumentStore, StoreError};

use crate::audit;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::services::Services;
use crate::signing::{PayloadEmbedder, SignedDocument, SigningPipeline, SigningRequest};
use crate::verification::{VerificationEngine, VerifierContext};

/// The main Engine struct.
///
/// Provides a unified API for:
/// - Signing documents
/// - Verifying presented documents
/// - Withdrawing documents
/// - Rotating the signing key
/// - Reading the audit trail
pub struct Engine<S> {
    store: Arc<S>,
    keys: Arc<KeyMaterialProvider>,
    signing: SigningPipeline,
    verification: VerificationEngine,
}

impl<S> Engine<S>
where
    S: DocumentStore + AuditSink + 'static,
{
    /// Create a new engine instance.
    pub fn new(keys: KeyMaterialProvider, store: S, config: EngineConfig) -> Self {
        Self::with_parts(Arc::new(keys), Arc::new(store), config)
    }

    /// Create an engine from shared parts.
    pub fn with_parts(keys: Arc<KeyMaterialProvider>, store: Arc<S>, config: EngineConfig) -> Self {
        let signing = SigningPipeline::new(keys.clone(), store.clone(), config);
        let verification = VerificationEngine::new(keys.clone(), store.clone(), store.clone());
        Self {
            store,
            keys,
            signing,
            verification,
        }
    }

    /// Replace the payload embedder.
    pub fn with_embedder(mut self, embedder: Arc<dyn PayloadEmbedder>) -> Self {
        self.signing = self.signing.with_embedder(embedder);
        self
    }

    /// Replace the cryptographic capabilities of both pipelines.
    pub fn with_services(mut self, services: Services) -> Self {
        self.signing = self.signing.with_services(services.clone());
        self.verification = self.verification.with_services(services);
        self
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the key provider.
    pub fn keys(&self) -> &KeyMaterialProvider {
        &self.keys
    }

    pub fn config(&self) -> &EngineConfig {
        self.signing.config()
    }

    /// Sign a document.
    pub async fn sign(&self, request: SigningRequest) -> Result<SignedDocument> {
        self.signing.sign(request).await
    }

    /// Verify presented bytes. Always returns one of the four outcomes.
    pub async fn verify(
        &self,
        document_id: &str,
        presented: &[u8],
        ctx: &VerifierContext,
    ) -> VerificationOutcome {
        self.verification.verify(document_id, presented, ctx).await
    }

    /// Verify a streamed document.
    pub async fn verify_reader(
        &self,
        document_id: &str,
        reader: &mut (dyn Read + Send),
        ctx: &VerifierContext,
    ) -> VerificationOutcome {
        self.verification
            .verify_reader(document_id, reader, ctx)
            .await
    }

    /// Mark a document withdrawn. It can never verify again.
    pub async fn withdraw(&self, id: &DocumentId) -> Result<()> {
        match self.store.set_status(id, DocumentStatus::Withdrawn).await {
            Ok(()) => {
                audit::log_document_withdrawn(id);
                Ok(())
            }
            Err(StoreError::NotFound(_)) => Err(EngineError::DocumentNotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Rotate the signing key and return the retired public key. Documents
    /// signed under the previous key no longer verify.
    pub fn rotate_key(&self, bits: u32) -> Result<PublicKey> {
        let previous = self.keys.rotate(bits)?;
        Ok(previous.public_key())
    }

    /// Audit entries recorded for a presented document id.
    pub async fn audit_entries(&self, document_id: &str) -> Result<Vec<AuditEntry>> {
        let key = match DocumentId::parse(document_id) {
            Ok(id) => id.to_string(),
            Err(_) => document_id.to_string(),
        };
        Ok(self.store.audit_entries(&key).await?)
    }
}
