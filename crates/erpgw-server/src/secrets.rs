//! Secret storage for the database password
//!
//! Secrets live next to the config file as `secrets/<key>.bin`. Keys are
//! sanitized to `[A-Za-z0-9._-]` before they touch the filesystem.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use erpgw_core::{GwError, GwErrorKind};
use erpgw_core_types::Sensitive;
use thiserror::Error;

/// Overrides the stored database password when set
pub const DB_PASSWORD_ENV: &str = "ERPGW_DB_PASSWORD";

#[derive(Error, Debug)]
pub enum SecretError {
    #[error("secret '{0}' not found")]
    NotFound(String),

    #[error("secret '{key}' is not valid UTF-8")]
    Encoding { key: String },

    #[error("secret store I/O failed for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<SecretError> for GwError {
    fn from(err: SecretError) -> Self {
        let kind = match err {
            SecretError::Io { .. } => GwErrorKind::Io,
            _ => GwErrorKind::Config,
        };
        GwError::new(kind)
            .with_op("load_secret")
            .with_message(err.to_string())
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait SecretStore: Send + Sync {
    /// # Errors
    ///
    /// `NotFound` when nothing is stored under `key`.
    fn get(&self, key: &str) -> Result<Vec<u8>, SecretError>;

    /// Replace the value under `key`.
    ///
    /// # Errors
    ///
    /// `Io` when the value cannot be written.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), SecretError>;
}

/// Plain-file secret store rooted at `<dir>/secrets`
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    dir: PathBuf,
}

impl FileSecretStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: base_dir.as_ref().join("secrets"),
        }
    }

    /// Store that sits beside the given config file
    pub fn beside(config_path: &Path) -> Self {
        let base = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::new(base)
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.bin", sanitize_key(key)))
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Vec<u8>, SecretError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SecretError::NotFound(key.to_string())),
            Err(source) => Err(SecretError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), SecretError> {
        let io = |source| SecretError::Io {
            key: key.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io)?;
        // temp file in the same directory so the rename stays atomic
        let mut tmp = tempfile::Builder::new()
            .prefix("secret-")
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(io)?;
        restrict_permissions(tmp.path()).map_err(io)?;
        tmp.write_all(value).map_err(io)?;
        tmp.as_file().sync_all().map_err(io)?;
        tmp.persist(self.path_for(key)).map_err(|e| io(e.error))?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Map a key onto a safe file stem
pub fn sanitize_key(key: &str) -> String {
    let out: String = key
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() {
        "empty".to_string()
    } else {
        out
    }
}

/// The database password: `env_override` when given, else the stored
/// secret. A missing secret yields an empty password.
///
/// # Errors
///
/// `Encoding` for a non-UTF-8 secret, `Io` when the store is unreadable.
pub fn resolve_db_password(
    store: &dyn SecretStore,
    key: &str,
    env_override: Option<String>,
) -> Result<Sensitive<String>, SecretError> {
    if let Some(password) = env_override {
        return Ok(Sensitive::new(password));
    }
    match store.get(key) {
        Ok(bytes) => String::from_utf8(bytes)
            .map(Sensitive::new)
            .map_err(|_| SecretError::Encoding {
                key: key.to_string(),
            }),
        Err(SecretError::NotFound(_)) => {
            tracing::warn!(key = key, "database password not found in secret store");
            Ok(Sensitive::default())
        }
        Err(e) => Err(e),
    }
}
