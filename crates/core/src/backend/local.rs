//! Local filesystem backend: one `<id>.md` file per case in a single directory.
//!
//! Writes go through a temporary file in the same directory which is then persisted, so a
//! reader sees either the old document or the new one. Creates persist without clobbering,
//! which turns a concurrent create of the same id into [`BackendError::AlreadyExists`].
//!
//! There is no locking between the version check and the write of an update: two admins
//! updating the same case at the same instant race and the last rename wins.

use super::{check_name, BackendError, BackendResult, CaseBackend, FileHandle};
use crate::case::VersionToken;
use crate::constants::id_from_file_name;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct LocalBackend {
    cases_dir: PathBuf,
}

/// Version token of a local document: hex SHA-256 of its bytes.
pub(crate) fn content_version(bytes: &[u8]) -> VersionToken {
    VersionToken::new(hex::encode(Sha256::digest(bytes)))
}

impl LocalBackend {
    /// Creates a backend rooted at `cases_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidLocation`] if the directory does not exist or is not a
    /// directory.
    pub fn new(cases_dir: &Path) -> BackendResult<Self> {
        if !cases_dir.is_dir() {
            return Err(BackendError::InvalidLocation(format!(
                "cases directory does not exist or is not a directory: {}",
                cases_dir.display()
            )));
        }
        Ok(Self {
            cases_dir: cases_dir.to_path_buf(),
        })
    }

    pub fn cases_dir(&self) -> &Path {
        &self.cases_dir
    }

    fn path_for(&self, name: &str) -> BackendResult<PathBuf> {
        check_name(name)?;
        Ok(self.cases_dir.join(name))
    }

    fn current_version(&self, path: &Path) -> BackendResult<Option<VersionToken>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(content_version(&bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BackendError::Io(e)),
        }
    }

    fn require_version(&self, name: &str, path: &Path, expected: &VersionToken) -> BackendResult<()> {
        match self.current_version(path)? {
            None => Err(BackendError::NotFound(name.to_owned())),
            Some(current) if &current != expected => {
                Err(BackendError::VersionMismatch(name.to_owned()))
            }
            Some(_) => Ok(()),
        }
    }

    fn staged(&self, content: &str) -> BackendResult<NamedTempFile> {
        let mut tmp = NamedTempFile::new_in(&self.cases_dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        Ok(tmp)
    }
}

#[async_trait]
impl CaseBackend for LocalBackend {
    fn describe(&self) -> String {
        format!("local directory {}", self.cases_dir.display())
    }

    async fn list(&self) -> BackendResult<Vec<FileHandle>> {
        let mut handles = Vec::new();
        for entry in fs::read_dir(&self.cases_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!("skipping non UTF-8 file name in {}", self.cases_dir.display());
                continue;
            };
            if id_from_file_name(&name).is_some() {
                handles.push(FileHandle {
                    name,
                    version: None,
                });
            }
        }
        // read_dir order is platform dependent
        handles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(handles)
    }

    async fn read(&self, name: &str) -> BackendResult<Option<String>> {
        let path = self.path_for(name)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BackendError::Io(e)),
        }
    }

    async fn read_versioned(&self, name: &str) -> BackendResult<Option<(String, VersionToken)>> {
        let path = self.path_for(name)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BackendError::Io(e)),
        };
        let version = content_version(&bytes);
        let content = String::from_utf8(bytes)
            .map_err(|e| BackendError::Io(std::io::Error::new(ErrorKind::InvalidData, e)))?;
        Ok(Some((content, version)))
    }

    async fn write(
        &self,
        name: &str,
        content: &str,
        _message: &str,
        expected: Option<&VersionToken>,
    ) -> BackendResult<()> {
        let path = self.path_for(name)?;
        match expected {
            None => {
                let tmp = self.staged(content)?;
                tmp.persist_noclobber(&path).map_err(|e| {
                    if e.error.kind() == ErrorKind::AlreadyExists {
                        BackendError::AlreadyExists(name.to_owned())
                    } else {
                        BackendError::Io(e.error)
                    }
                })?;
            }
            Some(expected) => {
                self.require_version(name, &path, expected)?;
                let tmp = self.staged(content)?;
                tmp.persist(&path).map_err(|e| BackendError::Io(e.error))?;
            }
        }
        tracing::debug!("wrote {}", path.display());
        Ok(())
    }

    async fn delete(
        &self,
        name: &str,
        expected: &VersionToken,
        _message: &str,
    ) -> BackendResult<()> {
        let path = self.path_for(name)?;
        self.require_version(name, &path, expected)?;
        fs::remove_file(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                BackendError::NotFound(name.to_owned())
            } else {
                BackendError::Io(e)
            }
        })
    }

    async fn version(&self, name: &str) -> BackendResult<Option<VersionToken>> {
        let path = self.path_for(name)?;
        self.current_version(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn backend() -> (TempDir, LocalBackend) {
        let temp = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp.path()).unwrap();
        (temp, backend)
    }

    #[test]
    fn new_rejects_missing_directory() {
        let temp = TempDir::new().unwrap();
        let result = LocalBackend::new(&temp.path().join("missing"));
        assert!(matches!(result, Err(BackendError::InvalidLocation(_))));
    }

    #[test]
    fn new_rejects_file_path() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            LocalBackend::new(&file),
            Err(BackendError::InvalidLocation(_))
        ));
    }

    #[tokio::test]
    async fn list_returns_only_markdown_files_sorted() {
        let (temp, backend) = backend();
        fs::write(temp.path().join("b.md"), "b").unwrap();
        fs::write(temp.path().join("a.md"), "a").unwrap();
        fs::write(temp.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(temp.path().join("dir.md")).unwrap();

        let names: Vec<String> = backend
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.name)
            .collect();
        assert_eq!(names, vec!["a.md", "b.md"]);
    }

    #[tokio::test]
    async fn read_missing_is_none() {
        let (_temp, backend) = backend();
        assert_eq!(backend.read("nope.md").await.unwrap(), None);
        assert_eq!(backend.version("nope.md").await.unwrap(), None);
    }

    #[tokio::test]
    async fn create_then_read_and_version() {
        let (_temp, backend) = backend();
        backend.write("c.md", "hello", "create", None).await.unwrap();

        assert_eq!(backend.read("c.md").await.unwrap().as_deref(), Some("hello"));
        assert_eq!(
            backend.version("c.md").await.unwrap(),
            Some(content_version(b"hello"))
        );
    }

    #[tokio::test]
    async fn create_refuses_existing_name() {
        let (_temp, backend) = backend();
        backend.write("c.md", "first", "create", None).await.unwrap();
        let err = backend.write("c.md", "second", "create", None).await.unwrap_err();

        assert!(matches!(err, BackendError::AlreadyExists(_)));
        assert_eq!(backend.read("c.md").await.unwrap().as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn update_requires_current_version() {
        let (_temp, backend) = backend();
        backend.write("c.md", "v1", "create", None).await.unwrap();
        let v1 = backend.version("c.md").await.unwrap().unwrap();

        backend.write("c.md", "v2", "update", Some(&v1)).await.unwrap();
        let err = backend.write("c.md", "v3", "update", Some(&v1)).await.unwrap_err();

        assert!(matches!(err, BackendError::VersionMismatch(_)));
        assert_eq!(backend.read("c.md").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let (_temp, backend) = backend();
        let token = content_version(b"whatever");
        let err = backend.write("c.md", "x", "update", Some(&token)).await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_checks_version_then_removes() {
        let (temp, backend) = backend();
        backend.write("c.md", "v1", "create", None).await.unwrap();

        let stale = content_version(b"other");
        let err = backend.delete("c.md", &stale, "delete").await.unwrap_err();
        assert!(matches!(err, BackendError::VersionMismatch(_)));

        let current = backend.version("c.md").await.unwrap().unwrap();
        backend.delete("c.md", &current, "delete").await.unwrap();
        assert!(!temp.path().join("c.md").exists());

        let err = backend.delete("c.md", &current, "delete").await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn writes_leave_no_temporary_files() {
        let (temp, backend) = backend();
        backend.write("c.md", "v1", "create", None).await.unwrap();
        let v1 = backend.version("c.md").await.unwrap().unwrap();
        backend.write("c.md", "v2", "update", Some(&v1)).await.unwrap();

        let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn rejects_path_like_names() {
        let (_temp, backend) = backend();
        let err = backend.read("../escape.md").await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidName(_)));
    }
}
