//! # Casebook Core
//!
//! Core business logic for the casebook: scam case write-ups stored as markdown documents
//! with a YAML frontmatter block.
//!
//! This crate contains:
//! - The document codec ([`markdown`]) and the case model ([`case`])
//! - The [`CaseStore`] with its two storage backends, a local directory and a GitHub
//!   repository
//! - The [`CaseDirectory`] listing service and the [`word_count`] utility
//!
//! **No API concerns**: authentication and HTTP serving belong in `api-shared` and
//! `api-rest`.

pub mod backend;
pub mod case;
pub mod commit;
pub mod config;
pub mod constants;
pub mod error;
pub mod listing;
pub mod markdown;
pub mod render;
pub mod store;
pub mod validation;
pub mod word_count;

pub use casebook_types::{CaseId, CaseIdError, NonEmptyText};

pub use case::{CaseData, CaseInput, CaseMeta, CaseSummary, VersionToken};
pub use config::{BackendConfig, CoreConfig, GitHubConfig, ListingFailurePolicy, StorageEnv};
pub use error::{CaseError, CaseResult};
pub use listing::CaseDirectory;
pub use markdown::{Document, FormatError, Metadata};
pub use store::CaseStore;
