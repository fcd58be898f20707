//! GitHub contents API backend.
//!
//! Every case is a file under one flat directory of a repository
//! (`/repos/{owner}/{repo}/contents/{path}/{name}`). GitHub's blob SHA is the version token:
//! updates and deletes send the SHA the caller last saw and GitHub refuses the commit when
//! the file has moved on.
//!
//! Each operation is a single request with no retry. Listing returns the SHAs GitHub
//! includes in the directory response, so a listing costs one request plus one per read.

use super::{check_name, BackendError, BackendResult, CaseBackend, FileHandle};
use crate::case::VersionToken;
use crate::config::GitHubConfig;
use crate::constants::{id_from_file_name, GITHUB_ACCEPT, GITHUB_USER_AGENT};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Longest error body kept in [`BackendError::Http`] messages.
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Clone)]
pub struct GitHubBackend {
    client: reqwest::Client,
    config: GitHubConfig,
}

/// Directory listing entry.
#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Single file response.
#[derive(Debug, Deserialize)]
struct ContentFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    sha: String,
}

/// Error body GitHub sends with 4xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

static SHA_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bsha\b").unwrap());

#[derive(Debug, Serialize)]
struct PutContentBody<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DeleteContentBody<'a> {
    message: &'a str,
    sha: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

impl GitHubBackend {
    /// Creates a backend for the configured repository.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidLocation`] when owner or repo are empty, and
    /// [`BackendError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: GitHubConfig) -> BackendResult<Self> {
        if config.owner.trim().is_empty() || config.repo.trim().is_empty() {
            return Err(BackendError::InvalidLocation(
                "GitHub owner and repo must be set".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .user_agent(GITHUB_USER_AGENT)
            .build()?;
        Ok(Self { client, config })
    }

    /// URL of the cases directory, or of `name` inside it.
    fn contents_url(&self, name: Option<&str>) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        let dir = self.config.path.trim_matches('/');
        let mut url = format!(
            "{base}/repos/{}/{}/contents",
            self.config.owner, self.config.repo
        );
        if !dir.is_empty() {
            url.push('/');
            url.push_str(dir);
        }
        if let Some(name) = name {
            url.push('/');
            url.push_str(name);
        }
        url
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method.clone(), url)
            .header(header::ACCEPT, GITHUB_ACCEPT);
        if let Some(token) = &self.config.token {
            builder = builder.bearer_auth(token);
        }
        if method == Method::GET {
            if let Some(branch) = &self.config.branch {
                builder = builder.query(&[("ref", branch)]);
            }
        }
        builder
    }

    /// Fetches a single file, `None` on 404.
    async fn fetch_file(&self, name: &str) -> BackendResult<Option<ContentFile>> {
        check_name(name)?;
        let response = self
            .request(Method::GET, &self.contents_url(Some(name)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response).await?;
        Ok(Some(response.json::<ContentFile>().await?))
    }
}

async fn ensure_success(response: reqwest::Response) -> BackendResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    Err(http_error(response).await)
}

async fn http_error(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    BackendError::Http {
        status,
        message: error_message(body),
    }
}

/// Decodes the `content` field of a file response.
///
/// GitHub wraps base64 at 60 columns, so embedded newlines are dropped before decoding.
fn decode_content(file: &ContentFile) -> BackendResult<String> {
    let content = file.content.as_deref().unwrap_or_default();
    match file.encoding.as_deref() {
        Some("base64") => {
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| BackendError::Decode(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| BackendError::Decode(e.to_string()))
        }
        Some("none") => Err(BackendError::Decode(
            "file too large for the contents API".into(),
        )),
        _ => Ok(content.to_owned()),
    }
}

/// Maps a non-success status of a PUT or DELETE to a backend error.
///
/// GitHub answers 409 when the supplied SHA is stale. It also uses 422 for SHA problems
/// ("sha wasn't supplied" when creating over an existing file, a mismatch on update), but
/// the same status covers unrelated validation failures such as an unknown branch. Only a
/// 422 whose message is about the SHA is treated as a conflict.
fn classify_write_failure(
    status: u16,
    name: &str,
    had_expected: bool,
    body: String,
) -> BackendError {
    match status {
        404 => BackendError::NotFound(name.to_owned()),
        409 => BackendError::VersionMismatch(name.to_owned()),
        422 if about_sha(&body) && had_expected => BackendError::VersionMismatch(name.to_owned()),
        422 if about_sha(&body) => BackendError::AlreadyExists(name.to_owned()),
        _ => BackendError::Http {
            status,
            message: error_message(body),
        },
    }
}

fn about_sha(body: &str) -> bool {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|err| SHA_WORD.is_match(&err.message))
        .unwrap_or(false)
}

/// The `message` field of a GitHub error body, or the raw body cut to a readable length.
fn error_message(body: String) -> String {
    let mut message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|err| err.message)
        .unwrap_or(body);
    if message.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|i| message.is_char_boundary(*i))
            .unwrap_or(0);
        message.truncate(cut);
    }
    message
}

fn is_case_file(entry: &ContentEntry) -> bool {
    entry.kind == "file" && id_from_file_name(&entry.name).is_some()
}

#[async_trait]
impl CaseBackend for GitHubBackend {
    fn describe(&self) -> String {
        format!(
            "GitHub {}/{} at /{}",
            self.config.owner,
            self.config.repo,
            self.config.path.trim_matches('/')
        )
    }

    async fn list(&self) -> BackendResult<Vec<FileHandle>> {
        let response = self
            .request(Method::GET, &self.contents_url(None))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::warn!("cases directory not found in {}", self.describe());
            return Ok(Vec::new());
        }
        let entries: Vec<ContentEntry> = ensure_success(response).await?.json().await?;
        Ok(entries
            .into_iter()
            .filter(is_case_file)
            .map(|entry| FileHandle {
                version: Some(VersionToken::new(entry.sha)),
                name: entry.name,
            })
            .collect())
    }

    async fn read(&self, name: &str) -> BackendResult<Option<String>> {
        match self.fetch_file(name).await? {
            Some(file) => decode_content(&file).map(Some),
            None => Ok(None),
        }
    }

    async fn read_versioned(&self, name: &str) -> BackendResult<Option<(String, VersionToken)>> {
        match self.fetch_file(name).await? {
            Some(file) => {
                let content = decode_content(&file)?;
                Ok(Some((content, VersionToken::new(file.sha))))
            }
            None => Ok(None),
        }
    }

    async fn write(
        &self,
        name: &str,
        content: &str,
        message: &str,
        expected: Option<&VersionToken>,
    ) -> BackendResult<()> {
        check_name(name)?;
        let body = PutContentBody {
            message,
            content: general_purpose::STANDARD.encode(content.as_bytes()),
            sha: expected.map(VersionToken::as_str),
            branch: self.config.branch.as_deref(),
        };
        let response = self
            .request(Method::PUT, &self.contents_url(Some(name)))
            .json(&body)
            .send()
            .await?;
        if response.status().is_success() {
            tracing::debug!("committed {name}: {message}");
            return Ok(());
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(classify_write_failure(status, name, expected.is_some(), body))
    }

    async fn delete(
        &self,
        name: &str,
        expected: &VersionToken,
        message: &str,
    ) -> BackendResult<()> {
        check_name(name)?;
        let body = DeleteContentBody {
            message,
            sha: expected.as_str(),
            branch: self.config.branch.as_deref(),
        };
        let response = self
            .request(Method::DELETE, &self.contents_url(Some(name)))
            .json(&body)
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(classify_write_failure(status, name, true, body))
    }

    async fn version(&self, name: &str) -> BackendResult<Option<VersionToken>> {
        Ok(self
            .fetch_file(name)
            .await?
            .map(|file| VersionToken::new(file.sha)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GitHubConfig {
        GitHubConfig {
            api_base: "https://api.github.com/".into(),
            owner: "acme".into(),
            repo: "cases-repo".into(),
            path: "/cases/".into(),
            branch: None,
            token: None,
        }
    }

    #[test]
    fn new_requires_owner_and_repo() {
        let mut cfg = config();
        cfg.owner = " ".into();
        assert!(matches!(
            GitHubBackend::new(cfg),
            Err(BackendError::InvalidLocation(_))
        ));
    }

    #[test]
    fn contents_url_joins_segments_once() {
        let backend = GitHubBackend::new(config()).unwrap();
        assert_eq!(
            backend.contents_url(None),
            "https://api.github.com/repos/acme/cases-repo/contents/cases"
        );
        assert_eq!(
            backend.contents_url(Some("a.md")),
            "https://api.github.com/repos/acme/cases-repo/contents/cases/a.md"
        );
    }

    #[test]
    fn contents_url_at_repository_root() {
        let mut cfg = config();
        cfg.path = String::new();
        let backend = GitHubBackend::new(cfg).unwrap();
        assert_eq!(
            backend.contents_url(Some("a.md")),
            "https://api.github.com/repos/acme/cases-repo/contents/a.md"
        );
    }

    #[test]
    fn decode_content_handles_wrapped_base64() {
        let encoded = general_purpose::STANDARD.encode("---\ntitle: 标题\n---\nbody");
        let (head, tail) = encoded.split_at(10);
        let file = ContentFile {
            content: Some(format!("{head}\n{tail}\n")),
            encoding: Some("base64".into()),
            sha: "abc".into(),
        };
        assert_eq!(decode_content(&file).unwrap(), "---\ntitle: 标题\n---\nbody");
    }

    #[test]
    fn decode_content_passes_plain_text_through() {
        let file = ContentFile {
            content: Some("plain".into()),
            encoding: None,
            sha: "abc".into(),
        };
        assert_eq!(decode_content(&file).unwrap(), "plain");
    }

    #[test]
    fn decode_content_rejects_bad_base64() {
        let file = ContentFile {
            content: Some("!!!".into()),
            encoding: Some("base64".into()),
            sha: "abc".into(),
        };
        assert!(matches!(decode_content(&file), Err(BackendError::Decode(_))));
    }

    const SHA_MISSING: &str = r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied.","documentation_url":"https://docs.github.com/rest"}"#;
    const SHA_MISMATCH: &str = r#"{"message":"a.md does not match 3d21ec53a331a6f037a91c368710b99387d012c1 sha"}"#;
    const NO_BRANCH: &str = r#"{"message":"Branch drafts not found","documentation_url":"https://docs.github.com/rest"}"#;

    #[test]
    fn classify_write_failure_distinguishes_conflicts() {
        assert!(matches!(
            classify_write_failure(409, "a.md", true, String::new()),
            BackendError::VersionMismatch(_)
        ));
        assert!(matches!(
            classify_write_failure(422, "a.md", false, SHA_MISSING.into()),
            BackendError::AlreadyExists(_)
        ));
        assert!(matches!(
            classify_write_failure(422, "a.md", true, SHA_MISMATCH.into()),
            BackendError::VersionMismatch(_)
        ));
        assert!(matches!(
            classify_write_failure(404, "a.md", true, String::new()),
            BackendError::NotFound(_)
        ));
        assert!(matches!(
            classify_write_failure(500, "a.md", true, "boom".into()),
            BackendError::Http { status: 500, .. }
        ));
    }

    #[test]
    fn unrelated_422_is_not_a_conflict() {
        let err = classify_write_failure(422, "a.md", false, NO_BRANCH.into());
        assert!(
            matches!(err, BackendError::Http { status: 422, ref message } if message == "Branch drafts not found")
        );
        assert!(matches!(
            classify_write_failure(422, "a.md", true, NO_BRANCH.into()),
            BackendError::Http { status: 422, .. }
        ));
        assert!(matches!(
            classify_write_failure(422, "a.md", false, "not json".into()),
            BackendError::Http { status: 422, .. }
        ));
    }

    #[test]
    fn sha_must_be_a_whole_word() {
        assert!(!about_sha(r#"{"message":"path is shallow"}"#));
        assert!(about_sha(SHA_MISSING));
    }

    #[test]
    fn listing_keeps_only_markdown_files() {
        let entries: Vec<ContentEntry> = serde_json::from_str(
            r#"[
                {"name": "a.md", "sha": "1", "type": "file"},
                {"name": "images", "sha": "2", "type": "dir"},
                {"name": "README.txt", "sha": "3", "type": "file"}
            ]"#,
        )
        .unwrap();
        let names: Vec<&str> = entries
            .iter()
            .filter(|e| is_case_file(e))
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["a.md"]);
    }

    #[test]
    fn put_body_omits_sha_on_create() {
        let body = PutContentBody {
            message: "case:create: a",
            content: "eA==".into(),
            sha: None,
            branch: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("sha").is_none());
        assert_eq!(json["message"], "case:create: a");
    }
}
