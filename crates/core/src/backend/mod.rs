//! Storage backends for case documents.
//!
//! The store talks to storage only through [`CaseBackend`]: a flat namespace of named text
//! files with list, read, write, delete and a version lookup. Two implementations exist:
//!
//! - [`LocalBackend`]: a directory on local disk, versions are SHA-256 digests of the file
//! - [`GitHubBackend`]: a subdirectory of a GitHub repository via the contents API, versions
//!   are the blob SHAs GitHub reports
//!
//! The backend is chosen once at startup ([`from_config`]) and the store never inspects
//! which one it holds.
//!
//! Writes and deletes take the version the caller last saw. A backend must refuse the
//! operation with [`BackendError::VersionMismatch`] when the stored document no longer has
//! that version, and a create (no expected version) must refuse with
//! [`BackendError::AlreadyExists`] when the name is taken.

mod github;
mod local;
#[cfg(test)]
pub(crate) mod memory;

pub use github::GitHubBackend;
pub use local::LocalBackend;

use crate::case::VersionToken;
use crate::config::BackendConfig;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("invalid storage location: {0}")]
    InvalidLocation(String),
    #[error("invalid file name: {0}")]
    InvalidName(String),
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("{0} has a different version than expected")]
    VersionMismatch(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("remote API returned {status}: {message}")]
    Http { status: u16, message: String },
    #[error("remote request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode remote content: {0}")]
    Decode(String),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// A stored file as reported by [`CaseBackend::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    /// Present when the backend learns versions for free while listing.
    pub version: Option<VersionToken>,
}

#[async_trait]
pub trait CaseBackend: Send + Sync + std::fmt::Debug {
    /// Human-readable location, used in logs.
    fn describe(&self) -> String;

    /// All stored case documents (names ending in `.md`).
    async fn list(&self) -> BackendResult<Vec<FileHandle>>;

    /// Content of `name`, or `None` when it does not exist.
    async fn read(&self, name: &str) -> BackendResult<Option<String>>;

    /// Content of `name` together with the version it was read at.
    ///
    /// The default asks for the version first and then reads, which is only consistent when
    /// nothing writes in between. Backends that learn both from one call override it.
    async fn read_versioned(&self, name: &str) -> BackendResult<Option<(String, VersionToken)>> {
        let Some(version) = self.version(name).await? else {
            return Ok(None);
        };
        Ok(self.read(name).await?.map(|content| (content, version)))
    }

    /// Creates `name` when `expected` is `None`, otherwise replaces it if its current
    /// version equals `expected`.
    async fn write(
        &self,
        name: &str,
        content: &str,
        message: &str,
        expected: Option<&VersionToken>,
    ) -> BackendResult<()>;

    /// Removes `name` if its current version equals `expected`.
    async fn delete(&self, name: &str, expected: &VersionToken, message: &str)
        -> BackendResult<()>;

    /// Current version of `name`, or `None` when it does not exist.
    async fn version(&self, name: &str) -> BackendResult<Option<VersionToken>>;
}

/// Builds the backend selected by configuration.
pub fn from_config(config: &BackendConfig) -> BackendResult<Arc<dyn CaseBackend>> {
    let backend: Arc<dyn CaseBackend> = match config {
        BackendConfig::Local { cases_dir } => Arc::new(LocalBackend::new(cases_dir)?),
        BackendConfig::GitHub(github) => Arc::new(GitHubBackend::new(github.clone())?),
    };
    tracing::info!("case storage: {}", backend.describe());
    Ok(backend)
}

/// File names are used directly as path segments, so they must be a single plain component.
pub(crate) fn check_name(name: &str) -> BackendResult<()> {
    let plain = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && name != "..";
    if plain {
        Ok(())
    } else {
        Err(BackendError::InvalidName(name.to_owned()))
    }
}
