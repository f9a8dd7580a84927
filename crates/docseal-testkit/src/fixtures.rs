//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use docseal::{Engine, EngineConfig, SignedDocument, SigningRequest, VerifierContext};
use docseal_core::{
    DocumentId, KeyPair, PersistedDocument, PublicKey, SignatureRecord, VerificationOutcome,
};
use docseal_keys::{KeyMaterialProvider, StaticKeySource};
use docseal_store::{DocumentStore, MemoryStore};

/// A minimal document that passes the default PDF policy.
pub fn sample_pdf(label: &str) -> Vec<u8> {
    format!(
        "%PDF-1.7\n1 0 obj << /Type /Catalog >> endobj\n% {}\n%%EOF\n",
        label
    )
    .into_bytes()
}

/// A test fixture with a key pair, a memory store and an engine over both.
pub struct TestFixture {
    pub keypair: KeyPair,
    pub keys: Arc<KeyMaterialProvider>,
    pub store: Arc<MemoryStore>,
    pub engine: Engine<MemoryStore>,
}

impl TestFixture {
    /// Create a new test fixture with a random key pair.
    pub fn new() -> Self {
        Self::build(KeyPair::generate(), EngineConfig::default())
    }

    /// Create with a deterministic key pair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::build(KeyPair::from_seed(&seed), EngineConfig::default())
    }

    /// Create with a specific configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self::build(KeyPair::generate(), config)
    }

    fn build(keypair: KeyPair, config: EngineConfig) -> Self {
        let keys = Arc::new(KeyMaterialProvider::with_keypair(
            Box::new(StaticKeySource::new(Some(keypair.clone()))),
            keypair.clone(),
        ));
        let store = Arc::new(MemoryStore::new());
        let engine = Engine::with_parts(keys.clone(), store.clone(), config);
        Self {
            keypair,
            keys,
            store,
            engine,
        }
    }

    /// The fixture's public key.
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// Sign content, panicking on failure.
    pub async fn sign(&self, content: &[u8]) -> SignedDocument {
        self.engine
            .sign(SigningRequest::new(content.to_vec()))
            .await
            .expect("fixture signing failed")
    }

    /// Verify with an empty context.
    pub async fn verify(&self, id: &DocumentId, presented: &[u8]) -> VerificationOutcome {
        self.engine
            .verify(&id.to_string(), presented, &VerifierContext::new())
            .await
    }

    /// The stored record for a document.
    pub async fn stored(&self, id: &DocumentId) -> PersistedDocument {
        self.store
            .get_document(id)
            .await
            .expect("store read failed")
            .expect("document not stored")
    }

    /// Rewrite a stored document in place, simulating tampering at rest.
    pub async fn tamper(&self, id: &DocumentId, f: impl FnOnce(&mut PersistedDocument)) {
        let mut document = self.stored(id).await;
        f(&mut document);
        self.store
            .replace_document(document)
            .expect("store write failed");
    }

    /// Flip one bit of the stored signature, leaving everything else intact.
    pub async fn flip_signature_bit(&self, id: &DocumentId, bit: usize) {
        self.tamper(id, |document| {
            let mut record = SignatureRecord::decode(&document.signature_record_encoded)
                .expect("stored record decodes");
            let bit = bit % (record.signature.len() * 8);
            record.signature[bit / 8] ^= 1 << (bit % 8);
            document.signature_record_encoded = record.encode().expect("record encodes");
        })
        .await;
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create fixtures with distinct deterministic keys.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            seed[31] = 0x5a;
            TestFixture::with_seed(seed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docseal_core::VerificationStatus;

    #[tokio::test]
    async fn test_fixture_sign_verify() {
        let fixture = TestFixture::new();
        let content = sample_pdf("fixture");
        let signed = fixture.sign(&content).await;

        let outcome = fixture.verify(&signed.document_id, &content).await;
        assert_eq!(outcome.status, VerificationStatus::Valid);
    }

    #[tokio::test]
    async fn test_flip_signature_bit() {
        let fixture = TestFixture::with_seed([3; 32]);
        let content = sample_pdf("flip");
        let signed = fixture.sign(&content).await;

        fixture.flip_signature_bit(&signed.document_id, 0).await;
        let stored = fixture.stored(&signed.document_id).await;
        let record = SignatureRecord::decode(&stored.signature_record_encoded).unwrap();
        assert_ne!(record.signature, signed.record.signature);
    }

    #[tokio::test]
    async fn test_multi_party() {
        let parties = multi_party_fixtures(3);

        let pks: Vec<_> = parties.iter().map(|p| p.public_key()).collect();
        assert_ne!(pks[0], pks[1]);
        assert_ne!(pks[1], pks[2]);
        assert_ne!(pks[0], pks[2]);
    }
}
