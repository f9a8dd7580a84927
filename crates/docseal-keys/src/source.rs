//! Where key material lives.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use docseal_core::{unix_now, KeyPair};

use crate::encoding::{decode_key_pair, encode_private_key, encode_public_key};
use crate::error::{KeyError, Result};

/// File name of the private key inside a key directory.
pub const SIGNING_KEY_FILE: &str = "signing_key.pem";

/// File name of the public key inside a key directory.
pub const VERIFYING_KEY_FILE: &str = "verifying_key.pem";

/// Default environment variable holding the private key PEM.
pub const SIGNING_KEY_ENV: &str = "DOCSEAL_SIGNING_KEY_PEM";

/// Default environment variable holding the public key PEM.
pub const VERIFYING_KEY_ENV: &str = "DOCSEAL_VERIFYING_KEY_PEM";

/// A place key material is loaded from and written to.
pub trait KeySource: Send + Sync {
    /// Load and validate the key pair.
    ///
    /// Returns `KeyNotFound` when there is no material at all and
    /// `InvalidKeyMaterial` when there is material that cannot be used.
    fn load(&self) -> Result<KeyPair>;

    /// Persist a key pair, replacing the current one.
    ///
    /// On failure the current material must still load.
    fn store(&self, keypair: &KeyPair) -> Result<()>;

    /// Keep a copy of the current material so `store` does not destroy it.
    /// The current material stays in place until `store` replaces it.
    fn archive(&self) -> Result<()>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// PEM files in a directory.
///
/// ```text
/// <dir>/signing_key.pem            current private key (mode 0600 on Unix)
/// <dir>/verifying_key.pem          current public key
/// <dir>/signing_key.pem.<secs>     archived by rotation
/// ```
#[derive(Debug, Clone)]
pub struct FileKeySource {
    dir: PathBuf,
}

impl FileKeySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn signing_key_path(&self) -> PathBuf {
        self.dir.join(SIGNING_KEY_FILE)
    }

    pub fn verifying_key_path(&self) -> PathBuf {
        self.dir.join(VERIFYING_KEY_FILE)
    }

    /// Archived files currently in the directory, oldest first.
    pub fn archived_files(&self) -> Result<Vec<PathBuf>> {
        let mut archived = Vec::new();
        if !self.dir.exists() {
            return Ok(archived);
        }
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            let is_archive = [SIGNING_KEY_FILE, VERIFYING_KEY_FILE].iter().any(|base| {
                name.strip_prefix(base)
                    .and_then(|rest| rest.strip_prefix('.'))
                    .map_or(false, |suffix| !suffix.ends_with("tmp"))
            });
            if is_archive {
                archived.push(path);
            }
        }
        archived.sort();
        Ok(archived)
    }
}

impl KeySource for FileKeySource {
    fn load(&self) -> Result<KeyPair> {
        let signing_path = self.signing_key_path();
        if !signing_path.exists() {
            return Err(KeyError::KeyNotFound(signing_path.display().to_string()));
        }
        let private_pem = fs::read_to_string(&signing_path)?;

        let verifying_path = self.verifying_key_path();
        let public_pem = if verifying_path.exists() {
            Some(fs::read_to_string(&verifying_path)?)
        } else {
            None
        };

        decode_key_pair(&private_pem, public_pem.as_deref())
    }

    fn store(&self, keypair: &KeyPair) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        // Both halves are staged before either is replaced.
        let signing = stage(&self.signing_key_path(), &encode_private_key(keypair), true)?;
        let verifying = match stage(
            &self.verifying_key_path(),
            &encode_public_key(&keypair.public_key()),
            false,
        ) {
            Ok(staged) => staged,
            Err(e) => {
                let _ = fs::remove_file(&signing);
                return Err(e);
            }
        };
        fs::rename(&signing, self.signing_key_path())?;
        fs::rename(&verifying, self.verifying_key_path())?;
        Ok(())
    }

    fn archive(&self) -> Result<()> {
        let stamp = unix_now();
        for path in [self.signing_key_path(), self.verifying_key_path()] {
            if !path.exists() {
                continue;
            }
            let target = archive_path(&path, stamp);
            fs::copy(&path, &target)?;
            tracing::debug!(from = %path.display(), to = %target.display(), "archived key file");
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.dir.display())
    }
}

/// `<path>.<stamp>`, with a counter appended if that name is taken.
fn archive_path(path: &Path, stamp: i64) -> PathBuf {
    let base = format!("{}.{}", path.display(), stamp);
    let mut candidate = PathBuf::from(&base);
    let mut n = 1;
    while candidate.exists() {
        candidate = PathBuf::from(format!("{}-{}", base, n));
        n += 1;
    }
    candidate
}

/// Write `contents` next to `path` and return the staged file.
fn stage(path: &Path, contents: &str, private: bool) -> Result<PathBuf> {
    let tmp = path.with_extension("pem.tmp");
    {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            if private {
                options.mode(0o600);
            }
        }
        #[cfg(not(unix))]
        let _ = private;
        let mut file = options.open(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
    }
    Ok(tmp)
}

/// PEM material in environment variables. Read-only.
#[derive(Debug, Clone)]
pub struct EnvKeySource {
    signing_var: String,
    verifying_var: String,
}

impl EnvKeySource {
    /// Read from `DOCSEAL_SIGNING_KEY_PEM` / `DOCSEAL_VERIFYING_KEY_PEM`.
    pub fn new() -> Self {
        Self::with_vars(SIGNING_KEY_ENV, VERIFYING_KEY_ENV)
    }

    pub fn with_vars(signing_var: impl Into<String>, verifying_var: impl Into<String>) -> Self {
        Self {
            signing_var: signing_var.into(),
            verifying_var: verifying_var.into(),
        }
    }
}

impl Default for EnvKeySource {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySource for EnvKeySource {
    fn load(&self) -> Result<KeyPair> {
        let private_pem = std::env::var(&self.signing_var)
            .map_err(|_| KeyError::KeyNotFound(format!("env:{}", self.signing_var)))?;
        let public_pem = std::env::var(&self.verifying_var).ok();
        decode_key_pair(&private_pem, public_pem.as_deref())
    }

    fn store(&self, _keypair: &KeyPair) -> Result<()> {
        Err(KeyError::ReadOnlySource("environment"))
    }

    fn archive(&self) -> Result<()> {
        Err(KeyError::ReadOnlySource("environment"))
    }

    fn describe(&self) -> String {
        format!("env:{}", self.signing_var)
    }
}

/// In-memory key material, for tests and embedding.
#[derive(Debug, Default)]
pub struct StaticKeySource {
    current: RwLock<Option<KeyPair>>,
    archived: RwLock<Vec<KeyPair>>,
}

impl StaticKeySource {
    pub fn new(keypair: Option<KeyPair>) -> Self {
        Self {
            current: RwLock::new(keypair),
            archived: RwLock::new(Vec::new()),
        }
    }

    /// Key pairs archived by rotation, oldest first.
    pub fn archived(&self) -> Result<Vec<KeyPair>> {
        Ok(self
            .archived
            .read()
            .map_err(|_| KeyError::LockPoisoned)?
            .clone())
    }
}

impl KeySource for StaticKeySource {
    fn load(&self) -> Result<KeyPair> {
        self.current
            .read()
            .map_err(|_| KeyError::LockPoisoned)?
            .clone()
            .ok_or_else(|| KeyError::KeyNotFound("static".into()))
    }

    fn store(&self, keypair: &KeyPair) -> Result<()> {
        *self.current.write().map_err(|_| KeyError::LockPoisoned)? = Some(keypair.clone());
        Ok(())
    }

    fn archive(&self) -> Result<()> {
        let previous = self
            .current
            .read()
            .map_err(|_| KeyError::LockPoisoned)?
            .clone();
        if let Some(previous) = previous {
            self.archived
                .write()
                .map_err(|_| KeyError::LockPoisoned)?
                .push(previous);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "static".into()
    }
}
