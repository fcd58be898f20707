//! In-memory versioned backend for store tests.
//!
//! Versions are a per-file revision counter, so every write produces a new token the way
//! a remote content API does. Reads of names in `broken` fail with an I/O error.

use super::{check_name, BackendError, BackendResult, CaseBackend, FileHandle};
use crate::case::VersionToken;
use crate::constants::id_from_file_name;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub(crate) struct MemoryBackend {
    files: Mutex<BTreeMap<String, (String, u64)>>,
    broken: Mutex<BTreeSet<String>>,
    writes: AtomicUsize,
    revisions: AtomicUsize,
}

impl MemoryBackend {
    pub(crate) fn insert(&self, name: &str, content: &str) {
        let rev = self.next_revision();
        self.files
            .lock()
            .unwrap()
            .insert(name.to_owned(), (content.to_owned(), rev));
    }

    pub(crate) fn break_reads(&self, name: &str) {
        self.broken.lock().unwrap().insert(name.to_owned());
    }

    pub(crate) fn content(&self, name: &str) -> Option<String> {
        self.files.lock().unwrap().get(name).map(|(c, _)| c.clone())
    }

    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn next_revision(&self) -> u64 {
        self.revisions.fetch_add(1, Ordering::SeqCst) as u64 + 1
    }

    fn token(rev: u64) -> VersionToken {
        VersionToken::new(format!("rev-{rev}"))
    }
}

#[async_trait]
impl CaseBackend for MemoryBackend {
    fn describe(&self) -> String {
        "in-memory".into()
    }

    async fn list(&self) -> BackendResult<Vec<FileHandle>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| id_from_file_name(name).is_some())
            .map(|(name, (_, rev))| FileHandle {
                name: name.clone(),
                version: Some(Self::token(*rev)),
            })
            .collect())
    }

    async fn read(&self, name: &str) -> BackendResult<Option<String>> {
        check_name(name)?;
        if self.broken.lock().unwrap().contains(name) {
            return Err(BackendError::Io(std::io::Error::other("injected read failure")));
        }
        Ok(self.content(name))
    }

    async fn write(
        &self,
        name: &str,
        content: &str,
        _message: &str,
        expected: Option<&VersionToken>,
    ) -> BackendResult<()> {
        check_name(name)?;
        let rev = self.next_revision();
        let mut files = self.files.lock().unwrap();
        match (files.get(name), expected) {
            (Some(_), None) => return Err(BackendError::AlreadyExists(name.to_owned())),
            (None, Some(_)) => return Err(BackendError::NotFound(name.to_owned())),
            (Some((_, current)), Some(expected)) if &Self::token(*current) != expected => {
                return Err(BackendError::VersionMismatch(name.to_owned()))
            }
            _ => {}
        }
        files.insert(name.to_owned(), (content.to_owned(), rev));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(
        &self,
        name: &str,
        expected: &VersionToken,
        _message: &str,
    ) -> BackendResult<()> {
        check_name(name)?;
        let mut files = self.files.lock().unwrap();
        match files.get(name) {
            None => Err(BackendError::NotFound(name.to_owned())),
            Some((_, current)) if &Self::token(*current) != expected => {
                Err(BackendError::VersionMismatch(name.to_owned()))
            }
            Some(_) => {
                files.remove(name);
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    async fn version(&self, name: &str) -> BackendResult<Option<VersionToken>> {
        check_name(name)?;
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(name)
            .map(|(_, rev)| Self::token(*rev)))
    }
}
