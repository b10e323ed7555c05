//! Credential persistence.
//!
//! # Design
//! - A store holds at most one token; `save` replaces it wholesale.
//! - `read` never mutates; unreadable or blank storage reads as "no token".
//! - `clear` is idempotent; clearing an empty store succeeds.
//! - No expiry is tracked. An expired token is only discovered by a 401.

use std::sync::{Mutex, PoisonError};

use crate::error::StoreError;
use crate::platform::MaybeSendSync;

/// Single-slot credential storage.
pub trait CredentialStore: MaybeSendSync {
    /// Replace any stored token with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage rejects the write.
    fn save(&self, token: &str) -> Result<(), StoreError>;

    /// Current token, if any.
    fn read(&self) -> Option<String>;

    /// Forget the stored token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage rejects the removal.
    fn clear(&self) -> Result<(), StoreError>;

    /// Whether a token is present (not whether it is valid).
    fn has_token(&self) -> bool {
        self.read().is_some()
    }
}

/// Normalise a raw stored value: blank means absent.
pub(crate) fn normalise(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// In-process store for tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, token: &str) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn read(&self) -> Option<String> {
        normalise(
            self.slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        )
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::{FileCredentialStore, default_credential_path};

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::fs;
    use std::io::{self, Write};
    use std::path::{Path, PathBuf};

    use tracing::warn;

    use super::{CredentialStore, normalise};
    use crate::config::CREDENTIAL_KEY;
    use crate::error::StoreError;

    /// `<config dir>/phishwatch/authToken`, when the platform has a config dir.
    #[must_use]
    pub fn default_credential_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("phishwatch").join(CREDENTIAL_KEY))
    }

    /// Token persisted in a single file.
    ///
    /// Writes go to a sibling temporary file that is renamed over the target,
    /// so readers observe either the old token or the new one.
    #[derive(Debug, Clone)]
    pub struct FileCredentialStore {
        path: PathBuf,
    }

    impl FileCredentialStore {
        /// Store backed by `path`. Nothing is touched until the first write.
        #[must_use]
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        /// File holding the token.
        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }

        fn staging_path(&self) -> PathBuf {
            let mut name = self
                .path
                .file_name()
                .map(|name| name.to_os_string())
                .unwrap_or_default();
            name.push(".tmp");
            self.path.with_file_name(name)
        }

        fn io_error(&self, operation: &'static str, source: io::Error) -> StoreError {
            StoreError::Io {
                operation,
                path: self.path.clone(),
                source,
            }
        }
    }

    impl CredentialStore for FileCredentialStore {
        fn save(&self, token: &str) -> Result<(), StoreError> {
            if let Some(parent) = self.path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).map_err(|err| self.io_error("create_dir", err))?;
            }
            let staging = self.staging_path();
            let mut file =
                fs::File::create(&staging).map_err(|err| self.io_error("create", err))?;
            restrict_permissions(&file).map_err(|err| self.io_error("chmod", err))?;
            file.write_all(token.as_bytes())
                .and_then(|()| file.sync_all())
                .map_err(|err| self.io_error("write", err))?;
            fs::rename(&staging, &self.path).map_err(|err| self.io_error("rename", err))
        }

        fn read(&self) -> Option<String> {
            match fs::read_to_string(&self.path) {
                Ok(raw) => normalise(Some(raw)),
                Err(err) if err.kind() == io::ErrorKind::NotFound => None,
                Err(err) => {
                    warn!(path = %self.path.display(), error = %err, "credential file unreadable");
                    None
                }
            }
        }

        fn clear(&self) -> Result<(), StoreError> {
            match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(self.io_error("remove", err)),
            }
        }
    }

    #[cfg(unix)]
    fn restrict_permissions(file: &fs::File) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))
    }

    #[cfg(not(unix))]
    #[allow(clippy::unnecessary_wraps)]
    fn restrict_permissions(_file: &fs::File) -> io::Result<()> {
        Ok(())
    }
}
