//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The binaries read environment variables and hand the raw values
//! to the `*_from_env_value` helpers here; nothing in the core reads the environment during
//! request handling.

use crate::constants::{DEFAULT_CASES_DIR, DEFAULT_GITHUB_API_BASE, DEFAULT_GITHUB_CASES_PATH};
use crate::{CaseError, CaseResult};
use std::path::{Path, PathBuf};

/// What `list_all` does when one stored document cannot be read or decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFailurePolicy {
    /// Fail the whole listing with the first error.
    Abort,
    /// Log the failure and leave the document out of the listing.
    Skip,
}

impl std::str::FromStr for ListingFailurePolicy {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(CaseError::InvalidConfig(format!(
                "unknown listing policy '{other}' (expected 'abort' or 'skip')"
            ))),
        }
    }
}

/// Coordinates and credentials of the remote repository holding case documents.
#[derive(Clone)]
pub struct GitHubConfig {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    /// Directory inside the repository, without leading or trailing slashes.
    pub path: String,
    pub branch: Option<String>,
    pub token: Option<String>,
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_base", &self.api_base)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("path", &self.path)
            .field("branch", &self.branch)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Which storage backend holds the cases.
#[derive(Clone, Debug)]
pub enum BackendConfig {
    Local { cases_dir: PathBuf },
    GitHub(GitHubConfig),
}

impl BackendConfig {
    /// The listing policy each backend used historically: a broken local file fails the
    /// listing, a broken remote file is skipped.
    pub fn default_listing_policy(&self) -> ListingFailurePolicy {
        match self {
            BackendConfig::Local { .. } => ListingFailurePolicy::Abort,
            BackendConfig::GitHub(_) => ListingFailurePolicy::Skip,
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    backend: BackendConfig,
    listing_policy: ListingFailurePolicy,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// When `listing_policy` is `None` the backend's default is used.
    pub fn new(backend: BackendConfig, listing_policy: Option<ListingFailurePolicy>) -> Self {
        let listing_policy = listing_policy.unwrap_or_else(|| backend.default_listing_policy());
        Self {
            backend,
            listing_policy,
        }
    }

    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }

    pub fn listing_policy(&self) -> ListingFailurePolicy {
        self.listing_policy
    }
}

/// Raw environment values for the storage configuration.
#[derive(Debug, Default, Clone)]
pub struct StorageEnv {
    pub backend: Option<String>,
    pub cases_dir: Option<String>,
    pub github_owner: Option<String>,
    pub github_repo: Option<String>,
    pub github_path: Option<String>,
    pub github_branch: Option<String>,
    pub github_api: Option<String>,
    pub github_token: Option<String>,
    pub listing_policy: Option<String>,
}

impl StorageEnv {
    /// Collects the storage variables through `lookup`, normally
    /// `|key| std::env::var(key).ok()`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            backend: lookup("CASES_BACKEND"),
            cases_dir: lookup("CASES_DIR"),
            github_owner: lookup("CASES_GITHUB_OWNER"),
            github_repo: lookup("CASES_GITHUB_REPO"),
            github_path: lookup("CASES_GITHUB_PATH"),
            github_branch: lookup("CASES_GITHUB_BRANCH"),
            github_api: lookup("CASES_GITHUB_API"),
            github_token: lookup("GITHUB_TOKEN"),
            listing_policy: lookup("CASES_LISTING_POLICY"),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the local cases directory.
///
/// The directory must already exist; the server never creates it on its own.
pub fn resolve_cases_dir(value: Option<String>) -> CaseResult<PathBuf> {
    let dir = non_empty(value).unwrap_or_else(|| DEFAULT_CASES_DIR.into());
    let path = Path::new(&dir);
    if !path.is_dir() {
        return Err(CaseError::InvalidConfig(format!(
            "cases directory does not exist: {}",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

/// Parse the listing policy from an optional string value. Empty means "backend default".
pub fn listing_policy_from_env_value(
    value: Option<String>,
) -> CaseResult<Option<ListingFailurePolicy>> {
    non_empty(value).map(|v| v.parse()).transpose()
}

/// Build the core configuration from raw environment values.
pub fn core_config_from_env_values(env: StorageEnv) -> CaseResult<CoreConfig> {
    let kind = non_empty(env.backend).unwrap_or_else(|| "local".into());
    let backend = match kind.to_ascii_lowercase().as_str() {
        "local" => BackendConfig::Local {
            cases_dir: resolve_cases_dir(env.cases_dir)?,
        },
        "github" => {
            let owner = non_empty(env.github_owner).ok_or_else(|| {
                CaseError::InvalidConfig("CASES_GITHUB_OWNER is required for the github backend".into())
            })?;
            let repo = non_empty(env.github_repo).ok_or_else(|| {
                CaseError::InvalidConfig("CASES_GITHUB_REPO is required for the github backend".into())
            })?;
            BackendConfig::GitHub(GitHubConfig {
                api_base: non_empty(env.github_api)
                    .unwrap_or_else(|| DEFAULT_GITHUB_API_BASE.into()),
                owner,
                repo,
                path: non_empty(env.github_path)
                    .unwrap_or_else(|| DEFAULT_GITHUB_CASES_PATH.into())
                    .trim_matches('/')
                    .to_string(),
                branch: non_empty(env.github_branch),
                token: non_empty(env.github_token),
            })
        }
        other => {
            return Err(CaseError::InvalidConfig(format!(
                "unknown CASES_BACKEND '{other}' (expected 'local' or 'github')"
            )))
        }
    };
    let policy = listing_policy_from_env_value(env.listing_policy)?;
    Ok(CoreConfig::new(backend, policy))
}
