//! Implementations of the `docseal` subcommands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use docseal::keys::source::SIGNING_KEY_ENV;
use docseal::keys::{EnvKeySource, FileKeySource, KeyMaterialProvider, KeySource};
use docseal::store::SqliteStore;
use docseal::{
    DocumentId, Engine, EngineConfig, EngineError, PayloadEmbedder, SigningRequest,
    VerificationStatus, VerifierContext,
};

/// Build the effective configuration: file (or defaults), then flag overrides.
pub fn load_config(
    path: Option<&Path>,
    key_dir: Option<PathBuf>,
    database: Option<PathBuf>,
) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(key_dir) = key_dir {
        config.key_dir = key_dir;
    }
    if let Some(database) = database {
        config.database_path = database;
    }
    Ok(config)
}

/// PEM material in the environment takes precedence over the key directory.
fn key_source(config: &EngineConfig) -> Box<dyn KeySource> {
    if std::env::var_os(SIGNING_KEY_ENV).is_some() {
        Box::new(EnvKeySource::new())
    } else {
        Box::new(FileKeySource::new(config.key_dir.clone()))
    }
}

fn open_engine(config: EngineConfig) -> Result<Engine<SqliteStore>> {
    let keys = KeyMaterialProvider::load(key_source(&config)).with_context(|| {
        format!(
            "No signing key available. Run `docseal keygen` or set {}",
            SIGNING_KEY_ENV
        )
    })?;
    let store = SqliteStore::open(&config.database_path).with_context(|| {
        format!("Failed to open database {}", config.database_path.display())
    })?;
    Ok(Engine::new(keys, store, config))
}

fn parse_id(id: &str) -> Result<DocumentId> {
    DocumentId::parse(id).with_context(|| format!("'{}' is not a document id", id))
}

pub fn keygen(config: &EngineConfig, bits: Option<u32>) -> Result<()> {
    let bits = bits.unwrap_or(config.key_size_bits);
    let keys = KeyMaterialProvider::load_or_generate(key_source(config), bits)?;
    println!("{}", keys.public_key()?.fingerprint());
    Ok(())
}

pub fn rotate(config: &EngineConfig, bits: Option<u32>) -> Result<()> {
    let bits = bits.unwrap_or(config.key_size_bits);
    let keys = KeyMaterialProvider::load(key_source(config))?;
    let previous = keys.rotate(bits)?;
    let current = keys.public_key()?;

    info!(
        previous = %previous.fingerprint(),
        current = %current.fingerprint(),
        "Signing key rotated; documents signed earlier will no longer verify"
    );
    println!("{}", current.fingerprint());
    Ok(())
}

/// Writes the encoded payload next to the signed document.
struct FileEmbedder {
    path: PathBuf,
}

#[async_trait]
impl PayloadEmbedder for FileEmbedder {
    async fn embed(&self, _document_id: &DocumentId, payload: &[u8]) -> docseal::Result<()> {
        tokio::fs::write(&self.path, payload)
            .await
            .map_err(|e| EngineError::Embedding(format!("{}: {}", self.path.display(), e)))
    }
}

pub async fn sign(
    config: EngineConfig,
    file: &Path,
    issuer: Option<String>,
    payload_out: Option<PathBuf>,
) -> Result<()> {
    let content =
        tokio::fs::read(file).await.with_context(|| format!("Failed to read {}", file.display()))?;

    let mut engine = open_engine(config)?;
    if let Some(path) = payload_out {
        engine = engine.with_embedder(Arc::new(FileEmbedder { path }));
    }

    let mut request = SigningRequest::new(content);
    if let Some(issuer) = issuer {
        request = request.issuer(issuer);
    }
    let signed = engine.sign(request).await?;

    let summary = serde_json::json!({
        "document_id": signed.document_id.to_string(),
        "hash": signed.digest.to_hex(),
        "signature": signed.record.tagged_signature(),
        "payload": String::from_utf8_lossy(&signed.payload_bytes),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Verify and print the report. Returns whether the document is valid.
pub async fn verify(
    config: EngineConfig,
    id: &str,
    file: &Path,
    client_ip: Option<String>,
    user_agent: Option<String>,
) -> Result<bool> {
    let engine = open_engine(config)?;
    let mut ctx = VerifierContext::new();
    if let Some(ip) = client_ip {
        ctx = ctx.client_ip(ip);
    }
    if let Some(agent) = user_agent {
        ctx = ctx.user_agent(agent);
    }

    let content =
        tokio::fs::read(file).await.with_context(|| format!("Failed to read {}", file.display()))?;
    let outcome = engine.verify(id, &content, &ctx).await;

    println!("{}", serde_json::to_string_pretty(&outcome.report())?);
    Ok(outcome.status == VerificationStatus::Valid)
}

pub async fn withdraw(config: EngineConfig, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let engine = open_engine(config)?;
    engine.withdraw(&id).await?;
    println!("{} withdrawn", id);
    Ok(())
}

pub async fn audit(config: EngineConfig, id: &str) -> Result<()> {
    let engine = open_engine(config)?;
    let entries = engine.audit_entries(id).await?;
    if entries.is_empty() {
        println!("no verification attempts recorded for {}", id);
        return Ok(());
    }

    for entry in entries {
        let d = entry.details;
        println!(
            "{}\t{}\tpayload={}\tsignature={}\thash={}\t{}\t{}",
            entry.verified_at,
            entry.status,
            check(d.payload_valid),
            check(d.signature_valid),
            check(d.hash_matches),
            entry.client_ip.as_deref().unwrap_or("-"),
            entry.reason.as_deref().unwrap_or(""),
        );
    }
    Ok(())
}

fn check(result: Option<bool>) -> &'static str {
    match result {
        Some(true) => "ok",
        Some(false) => "fail",
        None => "-",
    }
}
