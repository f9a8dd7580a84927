//! End-to-end signing and verification scenarios.

use std::io::Cursor;
use std::sync::Arc;

use docseal::core::{JsonPayloadCodec, KeyPair, PayloadCodec};
use docseal::keys::{FileKeySource, KeyError, KeyMaterialProvider, StaticKeySource};
use docseal::store::{AuditSink, DocumentStore, MemoryStore, SqliteStore};
use docseal::{
    CheckDetails, DocumentId, Engine, EngineConfig, EngineError, Services, SigningPipeline,
    SigningRequest, SigningStage, VerificationEngine, VerificationStatus, VerifierContext,
};
use docseal_testkit::{
    multi_party_fixtures, sample_pdf, CountingHasher, FailingAuditSink, FailingDocumentStore,
    RecordingEmbedder, TestFixture,
};

#[tokio::test]
async fn untouched_document_is_valid() {
    let fixture = TestFixture::new();
    let content = sample_pdf("diploma");
    let signed = fixture.sign(&content).await;

    let outcome = fixture.verify(&signed.document_id, &content).await;

    assert_eq!(outcome.status, VerificationStatus::Valid);
    assert_eq!(
        outcome.details,
        CheckDetails {
            payload_valid: Some(true),
            hash_matches: Some(true),
            signature_valid: Some(true),
        }
    );
    assert_eq!(outcome.reason, None);
}

#[tokio::test]
async fn one_changed_byte_is_content_modified() {
    let fixture = TestFixture::new();
    let content = sample_pdf("grade: B");
    let signed = fixture.sign(&content).await;

    let mut altered = content.clone();
    let pos = altered.len() - 10;
    altered[pos] ^= 0x01;

    let outcome = fixture.verify(&signed.document_id, &altered).await;

    assert_eq!(outcome.status, VerificationStatus::ContentModified);
    assert_eq!(outcome.details.hash_matches, Some(false));
    assert_eq!(outcome.details.signature_valid, Some(true));
    assert_eq!(outcome.details.payload_valid, Some(true));
}

#[tokio::test]
async fn flipped_signature_bit_is_invalid() {
    let fixture = TestFixture::with_seed([0x21; 32]);
    let content = sample_pdf("forged");
    let signed = fixture.sign(&content).await;

    fixture.flip_signature_bit(&signed.document_id, 77).await;
    let outcome = fixture.verify(&signed.document_id, &content).await;

    assert_eq!(outcome.status, VerificationStatus::Invalid);
    assert_eq!(outcome.details.signature_valid, Some(false));
    assert_eq!(outcome.details.hash_matches, Some(true));
}

#[tokio::test]
async fn unknown_id_is_error_without_digesting() {
    let keys = Arc::new(KeyMaterialProvider::with_keypair(
        Box::new(StaticKeySource::default()),
        KeyPair::from_seed(&[0x07; 32]),
    ));
    let store = Arc::new(MemoryStore::new());
    let hasher = Arc::new(CountingHasher::new());
    let engine = Engine::with_parts(keys, store.clone(), EngineConfig::default())
        .with_services(Services::default().with_hasher(hasher.clone()));

    let unknown = DocumentId::new().to_string();
    let outcome = engine
        .verify(&unknown, &sample_pdf("anything"), &VerifierContext::new())
        .await;

    assert_eq!(outcome.status, VerificationStatus::Error);
    assert_eq!(outcome.details, CheckDetails::default());
    assert_eq!(outcome.reason.as_deref(), Some("document not found"));
    assert_eq!(hasher.calls(), 0);
    assert_eq!(store.audit_entries(&unknown).await.unwrap().len(), 1);
}

#[tokio::test]
async fn signature_from_another_key_is_invalid() {
    let parties = multi_party_fixtures(2);
    let (registrar, impostor) = (&parties[0], &parties[1]);
    let content = sample_pdf("transcript");
    let genuine = registrar.sign(&content).await;
    let forged = impostor.sign(&content).await;

    // The forged record and a payload naming it are internally consistent.
    let forged_record = impostor.stored(&forged.document_id).await.signature_record_encoded;
    let mut payload = genuine.payload.clone();
    payload.signature = forged.record.tagged_signature();
    let payload_encoded = String::from_utf8(JsonPayloadCodec.encode(&payload).unwrap()).unwrap();
    registrar
        .tamper(&genuine.document_id, |document| {
            document.signature_record_encoded = forged_record;
            document.verification_payload_encoded = payload_encoded;
        })
        .await;

    let outcome = registrar.verify(&genuine.document_id, &content).await;

    assert_eq!(outcome.status, VerificationStatus::Invalid);
    assert_eq!(
        outcome.details,
        CheckDetails {
            payload_valid: Some(true),
            hash_matches: Some(true),
            signature_valid: Some(false),
        }
    );
}

#[tokio::test]
async fn id_spellings_share_one_audit_trail() {
    let fixture = TestFixture::new();
    let content = sample_pdf("certificate");
    let signed = fixture.sign(&content).await;
    let canonical = signed.document_id.to_string();

    let spellings = [
        canonical.to_uppercase(),
        format!("  {}  ", signed.document_id.as_uuid().simple()),
    ];
    for spelling in &spellings {
        let outcome = fixture
            .engine
            .verify(spelling, &content, &VerifierContext::new())
            .await;
        assert_eq!(outcome.status, VerificationStatus::Valid);
        assert_eq!(outcome.document_id, canonical);
    }

    assert_eq!(fixture.store.audit_entries(&canonical).await.unwrap().len(), 2);
    assert_eq!(
        fixture.engine.audit_entries(&spellings[0]).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn bad_payload_outranks_modified_content() {
    let fixture = TestFixture::new();
    let first = fixture.sign(&sample_pdf("first")).await;
    let second = fixture.sign(&sample_pdf("second")).await;

    let foreign_payload = fixture
        .stored(&second.document_id)
        .await
        .verification_payload_encoded;
    fixture
        .tamper(&first.document_id, |document| {
            document.verification_payload_encoded = foreign_payload;
        })
        .await;

    let outcome = fixture
        .verify(&first.document_id, &sample_pdf("edited"))
        .await;

    assert_eq!(outcome.status, VerificationStatus::Invalid);
    assert_eq!(outcome.details.payload_valid, Some(false));
    assert_eq!(outcome.details.signature_valid, Some(true));
    assert_eq!(outcome.details.hash_matches, Some(false));
}

#[tokio::test]
async fn corrupt_stored_record_is_error() {
    let fixture = TestFixture::new();
    let content = sample_pdf("corrupt");
    let signed = fixture.sign(&content).await;

    fixture
        .tamper(&signed.document_id, |document| {
            document.signature_record_encoded = "{not json".into();
        })
        .await;
    let outcome = fixture.verify(&signed.document_id, &content).await;

    assert_eq!(outcome.status, VerificationStatus::Error);
    assert_eq!(outcome.details, CheckDetails::default());
}

#[tokio::test]
async fn verification_is_idempotent_and_audited_each_time() {
    let fixture = TestFixture::new();
    let content = sample_pdf("transcript");
    let signed = fixture.sign(&content).await;
    let id = signed.document_id.to_string();
    let ctx = VerifierContext::new()
        .client_ip("203.0.113.9")
        .user_agent("registrar-portal/2.1");

    let first = fixture.engine.verify(&id, &content, &ctx).await;
    let second = fixture.engine.verify(&id, &content, &ctx).await;

    assert_eq!(first.status, second.status);
    assert_eq!(first.details, second.details);

    let entries = fixture.engine.audit_entries(&id).await.unwrap();
    assert_eq!(entries.len(), 2);
    for entry in &entries {
        assert_eq!(entry.status, VerificationStatus::Valid);
        assert_eq!(entry.client_ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(entry.user_agent.as_deref(), Some("registrar-portal/2.1"));
    }
}

#[tokio::test]
async fn each_outcome_is_audited_exactly_once() {
    let fixture = TestFixture::new();
    let content = sample_pdf("audited");
    let signed = fixture.sign(&content).await;

    fixture.verify(&signed.document_id, &content).await;
    fixture.verify(&signed.document_id, b"%PDF-1.7 other").await;
    fixture
        .engine
        .verify("not-a-uuid", &content, &VerifierContext::new())
        .await;

    assert_eq!(fixture.store.audit_len().unwrap(), 3);
    let statuses: Vec<_> = fixture
        .engine
        .audit_entries(&signed.document_id.to_string())
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.status)
        .collect();
    assert_eq!(
        statuses,
        vec![VerificationStatus::Valid, VerificationStatus::ContentModified]
    );
}

#[tokio::test]
async fn failing_audit_sink_still_returns_outcome() {
    let fixture = TestFixture::new();
    let content = sample_pdf("sink");
    let signed = fixture.sign(&content).await;

    let sink = Arc::new(FailingAuditSink::new());
    let verification = VerificationEngine::new(fixture.keys.clone(), fixture.store.clone(), sink.clone());

    let outcome = verification
        .verify(&signed.document_id.to_string(), &content, &VerifierContext::new())
        .await;

    assert_eq!(outcome.status, VerificationStatus::Valid);
    assert_eq!(sink.attempts(), 1);
}

#[tokio::test]
async fn withdrawn_document_never_verifies() {
    let fixture = TestFixture::new();
    let content = sample_pdf("withdrawn");
    let signed = fixture.sign(&content).await;

    fixture.engine.withdraw(&signed.document_id).await.unwrap();
    let outcome = fixture.verify(&signed.document_id, &content).await;

    assert_eq!(outcome.status, VerificationStatus::Error);
    assert_eq!(outcome.reason.as_deref(), Some("document is withdrawn"));
}

#[tokio::test]
async fn withdrawing_unknown_document_fails() {
    let fixture = TestFixture::new();
    let err = fixture.engine.withdraw(&DocumentId::new()).await.unwrap_err();
    assert!(matches!(err, EngineError::DocumentNotFound(_)));
}

#[tokio::test]
async fn rotation_invalidates_earlier_signatures() {
    let fixture = TestFixture::new();
    let content = sample_pdf("before rotation");
    let signed = fixture.sign(&content).await;

    let retired = fixture.engine.rotate_key(2048).unwrap();
    assert_eq!(retired, fixture.public_key());
    assert_ne!(fixture.keys.public_key().unwrap(), retired);

    let old = fixture.verify(&signed.document_id, &content).await;
    assert_eq!(old.status, VerificationStatus::Invalid);
    assert_eq!(old.details.signature_valid, Some(false));
    assert_eq!(old.details.payload_valid, Some(true));

    let fresh_content = sample_pdf("after rotation");
    let fresh = fixture.sign(&fresh_content).await;
    let outcome = fixture.verify(&fresh.document_id, &fresh_content).await;
    assert_eq!(outcome.status, VerificationStatus::Valid);
}

#[tokio::test]
async fn rotation_rejects_out_of_range_sizes() {
    let fixture = TestFixture::new();

    let small = fixture.engine.rotate_key(1024).unwrap_err();
    assert!(matches!(small, EngineError::Key(KeyError::KeyTooSmall { .. })));

    let large = fixture.engine.rotate_key(4096).unwrap_err();
    assert!(matches!(large, EngineError::Key(KeyError::UnsupportedKeySize { .. })));

    assert_eq!(fixture.keys.public_key().unwrap(), fixture.public_key());
}

#[tokio::test]
async fn failed_persistence_never_embeds() {
    let keys = Arc::new(KeyMaterialProvider::with_keypair(
        Box::new(StaticKeySource::default()),
        KeyPair::generate(),
    ));
    let embedder = Arc::new(RecordingEmbedder::new());
    let pipeline = SigningPipeline::new(keys, Arc::new(FailingDocumentStore), EngineConfig::default())
        .with_embedder(embedder.clone());

    let err = pipeline
        .sign(SigningRequest::new(sample_pdf("unstored")))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(SigningStage::Persisting));
    assert!(embedder.calls().is_empty());
}

#[tokio::test]
async fn embedder_receives_persisted_payload() {
    let fixture = TestFixture::new();
    let embedder = Arc::new(RecordingEmbedder::new());
    let engine = Engine::with_parts(
        fixture.keys.clone(),
        fixture.store.clone(),
        EngineConfig::default(),
    )
    .with_embedder(embedder.clone());

    let signed = engine
        .sign(SigningRequest::new(sample_pdf("embedded")))
        .await
        .unwrap();

    let calls = embedder.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, signed.document_id);
    assert_eq!(calls[0].1, signed.payload_bytes.to_vec());
}

#[tokio::test]
async fn failed_embedding_keeps_persisted_record() {
    let fixture = TestFixture::new();
    let engine = Engine::with_parts(
        fixture.keys.clone(),
        fixture.store.clone(),
        EngineConfig::default(),
    )
    .with_embedder(Arc::new(RecordingEmbedder::failing()));

    let err = engine
        .sign(SigningRequest::new(sample_pdf("no renderer")))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(SigningStage::Embedding));
    assert_eq!(fixture.store.count_documents().await.unwrap(), 1);
}

#[tokio::test]
async fn streamed_verification_matches_in_memory() {
    let fixture = TestFixture::new();
    let content = sample_pdf("streamed").repeat(4096);
    let signed = fixture.sign(&content).await;

    let outcome = fixture
        .engine
        .verify_reader(
            &signed.document_id.to_string(),
            &mut Cursor::new(content),
            &VerifierContext::new(),
        )
        .await;

    assert_eq!(outcome.status, VerificationStatus::Valid);
}

#[tokio::test]
async fn sqlite_engine_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("docseal.db");
    let key_dir = dir.path().join("keys");
    let content = sample_pdf("persistent");

    let id = {
        let keys = KeyMaterialProvider::load_or_generate(
            Box::new(FileKeySource::new(&key_dir)),
            2048,
        )
        .unwrap();
        let engine = Engine::new(keys, SqliteStore::open(&db).unwrap(), EngineConfig::default());
        engine
            .sign(SigningRequest::new(content.clone()))
            .await
            .unwrap()
            .document_id
    };

    let keys = KeyMaterialProvider::load(Box::new(FileKeySource::new(&key_dir))).unwrap();
    let engine = Engine::new(keys, SqliteStore::open(&db).unwrap(), EngineConfig::default());

    let outcome = engine
        .verify(&id.to_string(), &content, &VerifierContext::new())
        .await;
    assert_eq!(outcome.status, VerificationStatus::Valid);

    let modified = engine
        .verify(&id.to_string(), b"%PDF-1.7 swapped", &VerifierContext::new())
        .await;
    assert_eq!(modified.status, VerificationStatus::ContentModified);

    let entries = engine.audit_entries(&id.to_string()).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].details.hash_matches, Some(false));
}
