//! The signing pipeline.
//!
//! A single fail-fast pass:
//!
//! ```text
//! Validating -> Digesting -> Signing -> BuildingPayload -> Persisting -> Embedding -> Done
//! ```
//!
//! The document id is assigned together with the payload and written to the
//! store before the payload is handed to the embedder. If persistence fails
//! the embedder is never called, so no artifact exists for a record that was
//! not stored.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use docseal_core::{
    unix_now, validate_document, CoreError, Digest, DocumentId, DocumentStatus,
    PersistedDocument, SignatureRecord, VerificationPayload,
};
use docseal_keys::KeyMaterialProvider;
use docseal_store::{DocumentStore, InsertResult};

use crate::audit;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result, SigningStage};
use crate::services::Services;

/// A document submitted for signing.
#[derive(Debug, Clone)]
pub struct SigningRequest {
    /// The canonical bytes. These are what gets hashed, before any artifact
    /// is embedded into the document.
    pub content: Bytes,
    /// Overrides the configured issuer.
    pub issuer: Option<String>,
}

impl SigningRequest {
    pub fn new(content: impl Into<Bytes>) -> Self {
        Self {
            content: content.into(),
            issuer: None,
        }
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }
}

/// The result of a successful signing pass.
#[derive(Debug, Clone)]
pub struct SignedDocument {
    pub document_id: DocumentId,
    pub digest: Digest,
    pub record: SignatureRecord,
    pub payload: VerificationPayload,
    /// The encoded payload, as handed to the embedder.
    pub payload_bytes: Bytes,
}

/// Receives the encoded payload once the document is persisted, e.g. to
/// render it as a QR code into the document.
#[async_trait]
pub trait PayloadEmbedder: Send + Sync {
    async fn embed(&self, document_id: &DocumentId, payload: &[u8]) -> Result<()>;
}

/// Embedder that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmbedder;

#[async_trait]
impl PayloadEmbedder for NoopEmbedder {
    async fn embed(&self, _document_id: &DocumentId, _payload: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// Signs documents and persists their records.
pub struct SigningPipeline {
    keys: Arc<KeyMaterialProvider>,
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn PayloadEmbedder>,
    services: Services,
    config: EngineConfig,
}

impl SigningPipeline {
    pub fn new(
        keys: Arc<KeyMaterialProvider>,
        store: Arc<dyn DocumentStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            keys,
            store,
            embedder: Arc::new(NoopEmbedder),
            services: Services::default(),
            config,
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn PayloadEmbedder>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the pipeline once.
    ///
    /// Errors carry the stage that failed; see [`EngineError::stage`].
    pub async fn sign(&self, request: SigningRequest) -> Result<SignedDocument> {
        let result = self.run(request).await;
        if let Err(e) = &result {
            audit::log_sign_failed(e);
        }
        result
    }

    async fn run(&self, request: SigningRequest) -> Result<SignedDocument> {
        let SigningRequest { content, issuer } = request;

        tracing::debug!(stage = %SigningStage::Validating, size = content.len());
        validate_document(&content, &self.config.policy)
            .map_err(|e| EngineError::at(SigningStage::Validating, e))?;

        tracing::debug!(stage = %SigningStage::Digesting);
        let digest = self.services.hasher.digest(&content);

        tracing::debug!(stage = %SigningStage::Signing, digest = %digest);
        let keypair = self
            .keys
            .current()
            .map_err(|e| EngineError::at(SigningStage::Signing, e))?;
        let record = self
            .services
            .signer
            .sign(&digest, &keypair)
            .map_err(|e| EngineError::at(SigningStage::Signing, e))?;

        tracing::debug!(stage = %SigningStage::BuildingPayload);
        let document_id = DocumentId::new();
        let issued_at = unix_now();
        let payload = VerificationPayload::new(&document_id, &record, issued_at)
            .issuer(issuer.or_else(|| self.config.issuer.clone()))
            .verification_url(self.config.verification_url(&document_id));
        let payload_bytes = self
            .services
            .codec
            .encode(&payload)
            .map_err(|e| EngineError::at(SigningStage::BuildingPayload, e))?;
        let payload_encoded = String::from_utf8(payload_bytes.clone()).map_err(|e| {
            EngineError::at(
                SigningStage::BuildingPayload,
                CoreError::EncodingError(e.to_string()),
            )
        })?;
        let record_encoded = record
            .encode()
            .map_err(|e| EngineError::at(SigningStage::BuildingPayload, e))?;

        tracing::debug!(stage = %SigningStage::Persisting, document_id = %document_id);
        let document = PersistedDocument {
            id: document_id,
            digest_encoded: digest.to_hex(),
            signature_record_encoded: record_encoded,
            verification_payload_encoded: payload_encoded,
            status: DocumentStatus::Active,
            created_at: issued_at,
        };
        match self
            .store
            .insert_document(&document)
            .await
            .map_err(|e| EngineError::at(SigningStage::Persisting, e))?
        {
            InsertResult::Inserted => {}
            InsertResult::AlreadyExists => {
                return Err(EngineError::at(
                    SigningStage::Persisting,
                    EngineError::DuplicateDocument(document_id),
                ))
            }
        }

        tracing::debug!(stage = %SigningStage::Embedding, document_id = %document_id);
        self.embedder
            .embed(&document_id, &payload_bytes)
            .await
            .map_err(|e| EngineError::at(SigningStage::Embedding, e))?;

        audit::log_document_signed(&document_id, &digest.to_hex(), &keypair.fingerprint());
        Ok(SignedDocument {
            document_id,
            digest,
            record,
            payload,
            payload_bytes: Bytes::from(payload_bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docseal_core::{DocumentPolicy, JsonPayloadCodec, KeyPair, PayloadCodec, ValidationError};
    use docseal_keys::StaticKeySource;
    use docseal_store::MemoryStore;

    fn pipeline(store: Arc<MemoryStore>, config: EngineConfig) -> SigningPipeline {
        let keys = KeyMaterialProvider::with_keypair(
            Box::new(StaticKeySource::default()),
            KeyPair::from_seed(&[0x42; 32]),
        );
        SigningPipeline::new(Arc::new(keys), store, config)
    }

    #[tokio::test]
    async fn test_sign_persists_matching_record() {
        let store = Arc::new(MemoryStore::new());
        let config = EngineConfig {
            issuer: Some("Registrar".into()),
            verification_base_url: Some("https://verify.example/d".into()),
            ..EngineConfig::default()
        };
        let signed = pipeline(store.clone(), config)
            .sign(SigningRequest::new(&b"%PDF-1.7 transcript"[..]))
            .await
            .unwrap();

        let stored = store
            .get_document(&signed.document_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.digest_encoded, signed.digest.to_hex());
        assert_eq!(stored.status, DocumentStatus::Active);
        assert_eq!(
            stored.verification_payload_encoded.as_bytes(),
            &signed.payload_bytes[..]
        );

        let payload = JsonPayloadCodec.decode(&signed.payload_bytes).unwrap();
        assert_eq!(payload.document_id, signed.document_id.to_string());
        assert_eq!(payload.hash, signed.digest.to_hex());
        assert_eq!(payload.issuer.as_deref(), Some("Registrar"));
        assert_eq!(
            payload.verification_url,
            Some(format!("https://verify.example/d/{}", signed.document_id))
        );
    }

    #[tokio::test]
    async fn test_request_issuer_overrides_config() {
        let store = Arc::new(MemoryStore::new());
        let config = EngineConfig {
            issuer: Some("Default".into()),
            ..EngineConfig::default()
        };
        let signed = pipeline(store, config)
            .sign(SigningRequest::new(&b"%PDF-1.4"[..]).issuer("Dean"))
            .await
            .unwrap();
        assert_eq!(signed.payload.issuer.as_deref(), Some("Dean"));
    }

    #[tokio::test]
    async fn test_rejected_input_persists_nothing() {
        let store = Arc::new(MemoryStore::new());
        let config = EngineConfig {
            policy: DocumentPolicy {
                max_document_bytes: 16,
                ..DocumentPolicy::default()
            },
            ..EngineConfig::default()
        };
        let pipeline = pipeline(store.clone(), config);

        for (content, expected) in [
            (&b""[..], ValidationError::EmptyDocument),
            (
                &b"%PDF-1.7 longer than sixteen bytes"[..],
                ValidationError::TooLarge { size: 34, limit: 16 },
            ),
            (
                &b"GIF89a"[..],
                ValidationError::UnsupportedFormat {
                    expected: "pdf".into(),
                },
            ),
        ] {
            let err = pipeline
                .sign(SigningRequest::new(content.to_vec()))
                .await
                .unwrap_err();
            assert_eq!(err.stage(), Some(SigningStage::Validating));
            assert!(matches!(err.root(), EngineError::Validation(v) if *v == expected));
        }

        assert_eq!(store.count_documents().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = pipeline(store.clone(), EngineConfig::default());

        let a = pipeline
            .sign(SigningRequest::new(&b"%PDF-same"[..]))
            .await
            .unwrap();
        let b = pipeline
            .sign(SigningRequest::new(&b"%PDF-same"[..]))
            .await
            .unwrap();

        assert_ne!(a.document_id, b.document_id);
        assert!(a.digest.ct_eq(&b.digest));
        assert_eq!(store.count_documents().await.unwrap(), 2);
    }
}
