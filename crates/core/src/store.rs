//! The case store.
//!
//! [`CaseStore`] is the only way the rest of the system touches cases. It validates input,
//! encodes documents, and delegates physical I/O to whichever [`CaseBackend`] was configured
//! at startup. Every failure leaves this module as a [`CaseError`].
//!
//! Update and delete follow a compare-and-swap discipline: the store looks up the current
//! version immediately before writing and hands the backend either the version the caller
//! supplied or the one it just fetched. A stale caller version is reported as
//! [`CaseError::Conflict`]; the caller re-reads and tries again.

use crate::backend::{self, BackendError, CaseBackend};
use crate::case::{CaseData, CaseInput, CaseMeta, CaseSummary, VersionToken};
use crate::commit::{CaseCommitAction, CaseCommitMessage};
use crate::config::{CoreConfig, ListingFailurePolicy};
use crate::constants::{file_name_for, id_from_file_name};
use crate::markdown::{decode, encode};
use crate::validation::{validate_case_input, validate_upload_metadata};
use crate::word_count::word_count;
use crate::{CaseError, CaseResult};
use casebook_types::CaseId;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct CaseStore {
    backend: Arc<dyn CaseBackend>,
    listing_policy: ListingFailurePolicy,
}

impl CaseStore {
    pub fn new(backend: Arc<dyn CaseBackend>, listing_policy: ListingFailurePolicy) -> Self {
        Self {
            backend,
            listing_policy,
        }
    }

    /// Builds the configured backend and wraps it in a store.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::Backend`] if the backend cannot be constructed, for example when
    /// the local cases directory is missing.
    pub fn from_config(config: &CoreConfig) -> CaseResult<Self> {
        let backend = backend::from_config(config.backend())?;
        Ok(Self::new(backend, config.listing_policy()))
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    pub fn listing_policy(&self) -> ListingFailurePolicy {
        self.listing_policy
    }

    /// Summaries of every stored case, in backend enumeration order.
    ///
    /// A document that disappears between listing and reading is left out silently. Any
    /// other per-document failure (unreadable file, malformed frontmatter, unusable file
    /// name) is handled by the listing policy: `Abort` returns it, `Skip` logs it and
    /// carries on.
    pub async fn list_all(&self) -> CaseResult<Vec<CaseSummary>> {
        let handles = self.backend.list().await?;
        let mut summaries = Vec::with_capacity(handles.len());

        for handle in handles {
            match self.summarize(&handle.name).await {
                Ok(Some(summary)) => summaries.push(summary),
                Ok(None) => tracing::debug!("{} disappeared during listing", handle.name),
                Err(err) => match self.listing_policy {
                    ListingFailurePolicy::Abort => return Err(err),
                    ListingFailurePolicy::Skip => {
                        tracing::warn!("skipping {} in listing: {err}", handle.name);
                    }
                },
            }
        }

        Ok(summaries)
    }

    async fn summarize(&self, file_name: &str) -> CaseResult<Option<CaseSummary>> {
        // A stored name that is not a valid id is a storage fault, not bad input.
        let id = id_from_file_name(file_name)
            .and_then(|stem| CaseId::parse(stem).ok())
            .ok_or_else(|| BackendError::InvalidName(file_name.to_owned()))?;

        let Some(raw) = self.backend.read(file_name).await? else {
            return Ok(None);
        };
        let document = decode(&raw)?;
        let meta = CaseMeta::from_metadata(id, &document.metadata)?;

        Ok(Some(CaseSummary {
            meta,
            file_name: file_name.to_owned(),
            word_count: word_count(&document.body),
        }))
    }

    /// Reads one case with its body and the version it was read at.
    ///
    /// # Errors
    ///
    /// [`CaseError::NotFound`] when no document exists for `id`, [`CaseError::Format`] when
    /// the stored document cannot be decoded.
    pub async fn get(&self, id: &CaseId) -> CaseResult<CaseData> {
        let name = file_name_for(id.as_str());
        let (raw, version) = self
            .backend
            .read_versioned(&name)
            .await
            .map_err(|e| for_case(id, e))?
            .ok_or_else(|| not_found(id))?;

        let document = decode(&raw)?;
        let meta = CaseMeta::from_metadata(id.clone(), &document.metadata)?;
        Ok(CaseData {
            meta,
            content: document.body,
            version: Some(version),
        })
    }

    /// Whether a document exists for `id`.
    pub async fn exists(&self, id: &CaseId) -> CaseResult<bool> {
        let name = file_name_for(id.as_str());
        Ok(self.backend.version(&name).await?.is_some())
    }

    /// Creates a new case.
    ///
    /// Validation happens before any I/O, so a rejected input never leaves a file behind.
    ///
    /// # Errors
    ///
    /// - [`CaseError::Validation`] if a required field is missing or the date is malformed
    /// - [`CaseError::Conflict`] if a case with this id already exists
    pub async fn create(&self, id: &CaseId, input: &CaseInput) -> CaseResult<CaseMeta> {
        let meta = validate_case_input(id, input)?;
        let raw = encode(&meta.to_metadata(), &input.content)?;

        if self.exists(id).await? {
            return Err(CaseError::Conflict(format!("case {id} already exists")));
        }

        let message = CaseCommitMessage::new(CaseCommitAction::Create, id).to_string();
        self.backend
            .write(&file_name_for(id.as_str()), &raw, &message, None)
            .await
            .map_err(|e| for_case(id, e))?;

        tracing::info!("created case {id}");
        Ok(meta)
    }

    /// Replaces the metadata and body of an existing case.
    ///
    /// `expected` is the version the caller read. When it is `None` the store uses the
    /// version it fetches right before writing.
    ///
    /// # Errors
    ///
    /// - [`CaseError::Validation`] for missing fields
    /// - [`CaseError::NotFound`] if the case does not exist
    /// - [`CaseError::Conflict`] if the case changed since `expected` was read
    pub async fn update(
        &self,
        id: &CaseId,
        input: &CaseInput,
        expected: Option<VersionToken>,
    ) -> CaseResult<CaseMeta> {
        let meta = validate_case_input(id, input)?;
        let raw = encode(&meta.to_metadata(), &input.content)?;

        let name = file_name_for(id.as_str());
        let expected = self.expected_version(id, &name, expected).await?;

        let message = CaseCommitMessage::new(CaseCommitAction::Update, id).to_string();
        self.backend
            .write(&name, &raw, &message, Some(&expected))
            .await
            .map_err(|e| for_case(id, e))?;

        tracing::info!("updated case {id}");
        Ok(meta)
    }

    /// Deletes a case, under the same version discipline as [`CaseStore::update`].
    pub async fn delete(&self, id: &CaseId, expected: Option<VersionToken>) -> CaseResult<()> {
        let name = file_name_for(id.as_str());
        let expected = self.expected_version(id, &name, expected).await?;

        let message = CaseCommitMessage::new(CaseCommitAction::Delete, id).to_string();
        self.backend
            .delete(&name, &expected, &message)
            .await
            .map_err(|e| for_case(id, e))?;

        tracing::info!("deleted case {id}");
        Ok(())
    }

    /// Stores an uploaded markdown document as a new case, byte for byte.
    ///
    /// The document must decode and its frontmatter must name `id`, `title`, `description`
    /// and `date`.
    pub async fn import(&self, raw: &str) -> CaseResult<CaseMeta> {
        let document = decode(raw)?;
        let id = validate_upload_metadata(&document.metadata)?;
        let meta = CaseMeta::from_metadata(id.clone(), &document.metadata)?;

        if self.exists(&id).await? {
            return Err(CaseError::Conflict(format!("case {id} already exists")));
        }

        let message = CaseCommitMessage::new(CaseCommitAction::Import, &id).to_string();
        self.backend
            .write(&file_name_for(id.as_str()), raw, &message, None)
            .await
            .map_err(|e| for_case(&id, e))?;

        tracing::info!("imported case {id}");
        Ok(meta)
    }

    async fn expected_version(
        &self,
        id: &CaseId,
        name: &str,
        supplied: Option<VersionToken>,
    ) -> CaseResult<VersionToken> {
        let current = self
            .backend
            .version(name)
            .await
            .map_err(|e| for_case(id, e))?
            .ok_or_else(|| not_found(id))?;
        Ok(supplied.unwrap_or(current))
    }
}

fn not_found(id: &CaseId) -> CaseError {
    CaseError::NotFound(id.to_string())
}

/// Backend errors about the case file are reported against the case id.
fn for_case(id: &CaseId, err: BackendError) -> CaseError {
    match err {
        BackendError::NotFound(_) => not_found(id),
        BackendError::AlreadyExists(_) => {
            CaseError::Conflict(format!("case {id} already exists"))
        }
        BackendError::VersionMismatch(_) => CaseError::Conflict(format!(
            "case {id} was changed by someone else; reload and retry"
        )),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::backend::LocalBackend;
    use std::fs;
    use tempfile::TempDir;

    fn id(s: &str) -> CaseId {
        CaseId::parse(s).unwrap()
    }

    fn input(title: &str, date: &str) -> CaseInput {
        CaseInput {
            title: title.into(),
            description: "A scam".into(),
            image: None,
            date: date.into(),
            tags: Some(vec!["phone".into()]),
            content: "## Story\n\nThey called at night.\n".into(),
        }
    }

    fn local_store() -> (TempDir, CaseStore) {
        let temp = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp.path()).unwrap();
        let store = CaseStore::new(Arc::new(backend), ListingFailurePolicy::Abort);
        (temp, store)
    }

    fn memory_store(policy: ListingFailurePolicy) -> (Arc<MemoryBackend>, CaseStore) {
        let backend = Arc::new(MemoryBackend::default());
        let store = CaseStore::new(backend.clone(), policy);
        (backend, store)
    }

    #[tokio::test]
    async fn create_then_get_returns_same_case() {
        let (_temp, store) = local_store();
        let c1 = id("c1");
        let created = store.create(&c1, &input("Title", "2024-01-01")).await.unwrap();

        let data = store.get(&c1).await.unwrap();
        assert_eq!(data.meta, created);
        assert_eq!(data.meta.image, "/images/c1-cover.jpg");
        assert_eq!(data.content, "## Story\n\nThey called at night.\n");
        assert!(data.version.is_some());
    }

    #[tokio::test]
    async fn duplicate_create_conflicts_and_keeps_original() {
        let (temp, store) = local_store();
        let c1 = id("c1");
        store.create(&c1, &input("First", "2024-01-01")).await.unwrap();
        let before = fs::read_to_string(temp.path().join("c1.md")).unwrap();

        let err = store.create(&c1, &input("Second", "2024-02-02")).await.unwrap_err();
        assert!(matches!(err, CaseError::Conflict(_)));
        assert_eq!(fs::read_to_string(temp.path().join("c1.md")).unwrap(), before);
    }

    #[tokio::test]
    async fn missing_title_creates_nothing() {
        let (temp, store) = local_store();
        let err = store.create(&id("c1"), &input("", "2024-01-01")).await.unwrap_err();

        assert!(matches!(err, CaseError::Validation(_)));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let (_temp, store) = local_store();
        let err = store.get(&id("ghost")).await.unwrap_err();
        assert!(matches!(err, CaseError::NotFound(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn delete_then_get_and_second_delete_are_not_found() {
        let (_temp, store) = local_store();
        let c1 = id("c1");
        store.create(&c1, &input("T", "2024-01-01")).await.unwrap();

        store.delete(&c1, None).await.unwrap();
        assert!(matches!(store.get(&c1).await, Err(CaseError::NotFound(_))));
        assert!(matches!(store.delete(&c1, None).await, Err(CaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let (_temp, store) = local_store();
        let err = store
            .update(&id("nope"), &input("T", "2024-01-01"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_replaces_content_and_keeps_id() {
        let (_temp, store) = local_store();
        let c1 = id("c1");
        store.create(&c1, &input("Old", "2024-01-01")).await.unwrap();
        let version = store.get(&c1).await.unwrap().version;

        let mut next = input("New", "2024-02-01");
        next.content = "Rewritten.".into();
        store.update(&c1, &next, version).await.unwrap();

        let data = store.get(&c1).await.unwrap();
        assert_eq!(data.meta.title, "New");
        assert_eq!(data.meta.id.as_str(), "c1");
        assert_eq!(data.content, "Rewritten.");
    }

    #[tokio::test]
    async fn stale_version_conflicts_and_keeps_latest_write() {
        let (backend, store) = memory_store(ListingFailurePolicy::Skip);
        let c1 = id("c1");
        store.create(&c1, &input("v1", "2024-01-01")).await.unwrap();
        let stale = store.get(&c1).await.unwrap().version;

        store.update(&c1, &input("v2", "2024-01-01"), stale.clone()).await.unwrap();
        let latest = backend.content("c1.md").unwrap();

        let err = store
            .update(&c1, &input("v3", "2024-01-01"), stale.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, CaseError::Conflict(_)));
        assert_eq!(backend.content("c1.md").unwrap(), latest);

        let err = store.delete(&c1, stale).await.unwrap_err();
        assert!(matches!(err, CaseError::Conflict(_)));
        assert_eq!(backend.writes(), 2);
    }

    #[tokio::test]
    async fn stale_version_conflicts_on_local_backend() {
        let (_temp, store) = local_store();
        let c1 = id("c1");
        store.create(&c1, &input("v1", "2024-01-01")).await.unwrap();
        let stale = store.get(&c1).await.unwrap().version;
        store.update(&c1, &input("v2", "2024-01-01"), stale.clone()).await.unwrap();

        let err = store
            .update(&c1, &input("v3", "2024-01-01"), stale)
            .await
            .unwrap_err();
        assert!(matches!(err, CaseError::Conflict(_)));
        assert_eq!(store.get(&c1).await.unwrap().meta.title, "v2");
    }

    #[tokio::test]
    async fn list_all_reports_summaries_with_word_counts() {
        let (_temp, store) = local_store();
        store.create(&id("a"), &input("A", "2024-01-01")).await.unwrap();
        store.create(&id("b"), &input("B", "2024-06-01")).await.unwrap();

        let summaries = store.list_all().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].file_name, "a.md");
        assert_eq!(summaries[0].meta.tags, vec!["phone"]);
        assert_eq!(
            summaries[0].word_count,
            "Story They called at night.".chars().count()
        );
    }

    #[tokio::test]
    async fn list_all_abort_policy_fails_on_malformed_document() {
        let (temp, store) = local_store();
        store.create(&id("good"), &input("Good", "2024-01-01")).await.unwrap();
        fs::write(temp.path().join("bad.md"), "---\ntitle: [unclosed\n---\n").unwrap();

        assert!(matches!(store.list_all().await, Err(CaseError::Format(_))));
    }

    #[tokio::test]
    async fn list_all_abort_policy_reports_unusable_file_name_as_storage_failure() {
        let (temp, store) = local_store();
        store.create(&id("good"), &input("Good", "2024-01-01")).await.unwrap();
        fs::write(
            temp.path().join("Phone Scam.md"),
            "---\ntitle: T\ndescription: D\ndate: 2024-01-02\n---\nbody",
        )
        .unwrap();

        let err = store.list_all().await.unwrap_err();
        assert!(
            matches!(err, CaseError::Backend(BackendError::InvalidName(ref name)) if name == "Phone Scam.md")
        );
    }

    #[tokio::test]
    async fn list_all_skip_policy_leaves_out_unusable_file_name() {
        let (backend, store) = memory_store(ListingFailurePolicy::Skip);
        store.create(&id("good"), &input("Good", "2024-01-01")).await.unwrap();
        backend.insert("Phone Scam.md", "---\ntitle: T\n---\nbody");

        let summaries = store.list_all().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].meta.id.as_str(), "good");
    }

    #[tokio::test]
    async fn list_all_skip_policy_leaves_out_broken_documents() {
        let (backend, store) = memory_store(ListingFailurePolicy::Skip);
        store.create(&id("good"), &input("Good", "2024-01-01")).await.unwrap();
        backend.insert("malformed.md", "---\ntitle: x\n");
        backend.insert("unreadable.md", "---\ntitle: y\n---\n");
        backend.break_reads("unreadable.md");

        let summaries = store.list_all().await.unwrap();
        let ids: Vec<&str> = summaries.iter().map(|s| s.meta.id.as_str()).collect();
        assert_eq!(ids, vec!["good"]);
    }

    #[tokio::test]
    async fn list_all_abort_policy_surfaces_read_failure() {
        let (backend, store) = memory_store(ListingFailurePolicy::Abort);
        backend.insert("unreadable.md", "---\ntitle: y\n---\n");
        backend.break_reads("unreadable.md");

        assert!(matches!(store.list_all().await, Err(CaseError::Backend(_))));
    }

    #[tokio::test]
    async fn import_stores_document_verbatim() {
        let (temp, store) = local_store();
        let raw = "---\nid: up-1\ntitle: Uploaded\ndescription: D\ndate: 2024-03-03\nextra: kept\n---\n# Hi\n";

        let meta = store.import(raw).await.unwrap();
        assert_eq!(meta.id.as_str(), "up-1");
        assert_eq!(fs::read_to_string(temp.path().join("up-1.md")).unwrap(), raw);

        assert!(matches!(store.import(raw).await, Err(CaseError::Conflict(_))));
    }

    #[tokio::test]
    async fn import_rejects_incomplete_frontmatter() {
        let (temp, store) = local_store();
        let err = store.import("---\nid: x\n---\nbody").await.unwrap_err();

        assert!(matches!(err, CaseError::Validation(_)));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }
}
