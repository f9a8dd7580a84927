//! The verification engine: decides whether a presented document is the one
//! that was signed.
//!
//! ## Procedure
//!
//! 1. Fetch the persisted document. Unknown, malformed or withdrawn ids are
//!    `Error`, never `Invalid`: absence is not evidence of tampering.
//! 2. Decode the stored signature record and payload. Corrupt engine-owned
//!    data is `Error`.
//! 3. Digest the presented bytes.
//! 4. Payload check: the stored payload must name this id, this digest and
//!    this signature.
//! 5. Signature check: the stored signature over the *stored* digest, under
//!    the current public key. This says nothing about the presented bytes.
//! 6. Compare the presented digest with the stored digest in constant time.
//! 7. Classify. A bad payload or signature is `Invalid` even when the content
//!    also differs, so a forgery is never reported as a mere modification.
//!
//! Every attempt, whichever step it stops at, is logged and written to the
//! audit sink exactly once.

use std::io::Read;
use std::sync::Arc;

use docseal_core::{
    CheckDetails, Digest, DocumentId, PersistedDocument, SignatureRecord, VerificationOutcome,
    VerificationPayload,
};
use docseal_keys::KeyMaterialProvider;
use docseal_store::{AuditEntry, AuditSink, DocumentStore};

use crate::audit;
use crate::services::Services;

/// Caller-supplied context recorded with the audit entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifierContext {
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl VerifierContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_ip(mut self, ip: impl Into<String>) -> Self {
        self.client_ip = Some(ip.into());
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }
}

/// The bytes under test.
enum Presented<'a> {
    Bytes(&'a [u8]),
    Reader(&'a mut (dyn Read + Send)),
}

/// Stored data that decoded cleanly.
struct Decoded {
    id: DocumentId,
    digest: Digest,
    record: SignatureRecord,
    payload: VerificationPayload,
}

/// Verifies presented documents against persisted records.
pub struct VerificationEngine {
    keys: Arc<KeyMaterialProvider>,
    documents: Arc<dyn DocumentStore>,
    audit: Arc<dyn AuditSink>,
    services: Services,
}

impl VerificationEngine {
    pub fn new(
        keys: Arc<KeyMaterialProvider>,
        documents: Arc<dyn DocumentStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            keys,
            documents,
            audit,
            services: Services::default(),
        }
    }

    pub fn with_services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    /// Verify in-memory bytes.
    pub async fn verify(
        &self,
        document_id: &str,
        presented: &[u8],
        ctx: &VerifierContext,
    ) -> VerificationOutcome {
        let outcome = self
            .evaluate(document_id, Presented::Bytes(presented))
            .await;
        self.finish(outcome, ctx).await
    }

    /// Verify a document read from a stream. Read failures become `Error`
    /// outcomes.
    pub async fn verify_reader(
        &self,
        document_id: &str,
        reader: &mut (dyn Read + Send),
        ctx: &VerifierContext,
    ) -> VerificationOutcome {
        let outcome = self
            .evaluate(document_id, Presented::Reader(reader))
            .await;
        self.finish(outcome, ctx).await
    }

    async fn finish(&self, outcome: VerificationOutcome, ctx: &VerifierContext) -> VerificationOutcome {
        audit::log_verification(&outcome, ctx);

        let entry =
            AuditEntry::from_outcome(&outcome, ctx.client_ip.clone(), ctx.user_agent.clone());
        if let Err(e) = self.audit.record_verification(&entry).await {
            audit::log_audit_sink_failed(&outcome.document_id, &e);
        }

        outcome
    }

    async fn evaluate(&self, document_id: &str, presented: Presented<'_>) -> VerificationOutcome {
        // Outcomes and audit entries are keyed by the canonical id form.
        let parsed = DocumentId::parse(document_id).ok();
        let key = match &parsed {
            Some(id) => id.to_string(),
            None => document_id.to_string(),
        };
        let fail = |details: CheckDetails, reason: String| {
            VerificationOutcome::error(key.as_str(), details, reason)
        };

        // 1. Fetch.
        let id = match parsed {
            Some(id) => id,
            None => return fail(CheckDetails::default(), "document not found".into()),
        };
        let document = match self.documents.get_document(&id).await {
            Ok(Some(document)) => document,
            Ok(None) => return fail(CheckDetails::default(), "document not found".into()),
            Err(e) => return fail(CheckDetails::default(), format!("storage unavailable: {}", e)),
        };
        if !document.status.is_verifiable() {
            return fail(
                CheckDetails::default(),
                format!("document is {}", document.status),
            );
        }

        // 2. Decode engine-owned data.
        let stored = match self.decode(document) {
            Ok(stored) => stored,
            Err(reason) => return fail(CheckDetails::default(), reason),
        };

        // 3. Digest what was presented.
        let presented_digest = match presented {
            Presented::Bytes(bytes) => self.services.hasher.digest(bytes),
            Presented::Reader(reader) => match self.services.hasher.digest_reader(reader) {
                Ok(digest) => digest,
                Err(e) => {
                    return fail(
                        CheckDetails::default(),
                        format!("could not read presented document: {}", e),
                    )
                }
            },
        };

        // 4. Is the artifact itself trustworthy?
        let payload_valid = payload_consistent(&stored);
        let details = CheckDetails {
            payload_valid: Some(payload_valid),
            ..CheckDetails::default()
        };

        // 5. Was the original legitimately signed?
        let public_key = match self.keys.public_key() {
            Ok(key) => key,
            Err(e) => return fail(details, format!("verification key unavailable: {}", e)),
        };
        let signature_valid =
            match self
                .services
                .signer
                .verify(&stored.record.digest, &stored.record, &public_key)
            {
                Ok(valid) => valid,
                Err(e) => return fail(details, format!("signature could not be checked: {}", e)),
            };

        // 6. Does the presented content match?
        let hash_matches = presented_digest.ct_eq(&stored.digest);

        // 7. Classify.
        VerificationOutcome::verdict(key.as_str(), payload_valid, signature_valid, hash_matches)
    }

    fn decode(&self, document: PersistedDocument) -> Result<Decoded, String> {
        let digest = Digest::from_hex(&document.digest_encoded)
            .map_err(|e| format!("stored digest is corrupt: {}", e))?;
        let record = SignatureRecord::decode(&document.signature_record_encoded)
            .map_err(|e| format!("stored signature record is corrupt: {}", e))?;
        let payload = self
            .services
            .codec
            .decode(document.verification_payload_encoded.as_bytes())
            .map_err(|e| format!("stored verification payload is corrupt: {}", e))?;

        if !digest.ct_eq(&record.digest) {
            return Err("stored digest disagrees with the signature record".into());
        }

        Ok(Decoded {
            id: document.id,
            digest,
            record,
            payload,
        })
    }
}

/// The payload must name the stored id, digest and signature.
fn payload_consistent(stored: &Decoded) -> bool {
    let id_matches = DocumentId::parse(&stored.payload.document_id)
        .map_or(false, |id| id == stored.id);
    let digest_matches = stored
        .payload
        .digest()
        .map_or(false, |digest| digest.ct_eq(&stored.digest));
    let signature_matches = stored.record.matches_tagged(&stored.payload.signature);

    id_matches & digest_matches & signature_matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use docseal_core::{KeyPair, VerificationStatus};
    use docseal_keys::StaticKeySource;
    use docseal_store::MemoryStore;

    use crate::config::EngineConfig;
    use crate::signing::{SigningPipeline, SigningRequest};

    async fn setup() -> (Arc<MemoryStore>, SigningPipeline, VerificationEngine) {
        let store = Arc::new(MemoryStore::new());
        let keys = Arc::new(KeyMaterialProvider::with_keypair(
            Box::new(StaticKeySource::default()),
            KeyPair::from_seed(&[0x11; 32]),
        ));
        let signing = SigningPipeline::new(keys.clone(), store.clone(), EngineConfig::default());
        let verification = VerificationEngine::new(keys, store.clone(), store.clone());
        (store, signing, verification)
    }

    #[tokio::test]
    async fn test_valid_and_modified() {
        let (_store, signing, verification) = setup().await;
        let signed = signing
            .sign(SigningRequest::new(&b"%PDF-1.7 diploma"[..]))
            .await
            .unwrap();
        let id = signed.document_id.to_string();
        let ctx = VerifierContext::new();

        let valid = verification.verify(&id, b"%PDF-1.7 diploma", &ctx).await;
        assert_eq!(valid.status, VerificationStatus::Valid);

        let modified = verification.verify(&id, b"%PDF-1.7 diplomA", &ctx).await;
        assert_eq!(modified.status, VerificationStatus::ContentModified);
        assert_eq!(modified.details.hash_matches, Some(false));
        assert_eq!(modified.details.signature_valid, Some(true));
        assert_eq!(modified.details.payload_valid, Some(true));
    }

    #[tokio::test]
    async fn test_malformed_id_is_error_and_audited() {
        let (store, _signing, verification) = setup().await;
        let outcome = verification
            .verify("../etc/passwd", b"%PDF-", &VerifierContext::new())
            .await;

        assert_eq!(outcome.status, VerificationStatus::Error);
        assert_eq!(outcome.details, CheckDetails::default());
        assert_eq!(store.audit_entries("../etc/passwd").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reader_error_is_error_outcome() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"))
            }
        }

        let (_store, signing, verification) = setup().await;
        let signed = signing
            .sign(SigningRequest::new(&b"%PDF-1.7"[..]))
            .await
            .unwrap();

        let outcome = verification
            .verify_reader(
                &signed.document_id.to_string(),
                &mut Broken,
                &VerifierContext::new(),
            )
            .await;
        assert_eq!(outcome.status, VerificationStatus::Error);
        assert!(outcome.reason.unwrap().contains("disk gone"));
    }

    #[tokio::test]
    async fn test_reader_matches_bytes() {
        let (_store, signing, verification) = setup().await;
        let content = b"%PDF-1.7 streamed".to_vec();
        let signed = signing
            .sign(SigningRequest::new(content.clone()))
            .await
            .unwrap();

        let mut reader = std::io::Cursor::new(content);
        let outcome = verification
            .verify_reader(
                &signed.document_id.to_string(),
                &mut reader,
                &VerifierContext::new(),
            )
            .await;
        assert_eq!(outcome.status, VerificationStatus::Valid);
    }
}
