//! Engine configuration.
//!
//! Every field has a default, so an empty TOML file is a valid configuration:
//!
//! ```toml
//! issuer = "Office of the Registrar"
//! verification_base_url = "https://verify.example.edu/d"
//! key_dir = "/var/lib/docseal/keys"
//! key_size_bits = 3072
//!
//! [policy]
//! max_document_bytes = 10485760
//! accepted_formats = ["pdf"]
//! ```

use std::path::{Path, PathBuf};

use docseal_core::{DocumentId, DocumentPolicy};
use docseal_keys::MIN_KEY_SIZE_BITS;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Configuration for the engine and its key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Issuer recorded in payloads when a request names none.
    pub issuer: Option<String>,
    /// Base for per-document verification URLs, without trailing slash.
    pub verification_base_url: Option<String>,
    /// What the signing pipeline accepts.
    pub policy: DocumentPolicy,
    /// Directory holding `signing_key.pem` and `verifying_key.pem`.
    pub key_dir: PathBuf,
    /// Requested key strength in RSA-equivalent bits.
    pub key_size_bits: u32,
    /// SQLite database used by file-backed deployments.
    pub database_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            issuer: None,
            verification_base_url: None,
            policy: DocumentPolicy::default(),
            key_dir: PathBuf::from("keys"),
            key_size_bits: MIN_KEY_SIZE_BITS,
            database_path: PathBuf::from("docseal.db"),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// The verification URL for a document, if a base URL is configured.
    pub fn verification_url(&self, id: &DocumentId) -> Option<String> {
        self.verification_base_url
            .as_deref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), id))
    }
}
