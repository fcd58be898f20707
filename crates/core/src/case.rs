//! Case data model and its mapping onto document metadata.

use crate::constants::default_image_for;
use crate::markdown::{FormatError, Metadata};
use casebook_types::CaseId;
use serde::Deserialize;

/// Opaque fingerprint of a stored document's current content.
///
/// Returned on read and required as a precondition for update and delete so that a stale
/// writer cannot blindly overwrite someone else's change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata of a case, without its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseMeta {
    pub id: CaseId,
    pub title: String,
    pub description: String,
    pub image: String,
    pub date: String,
    pub tags: Vec<String>,
}

/// A listed case: metadata plus the plain-text length of its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseSummary {
    pub meta: CaseMeta,
    pub file_name: String,
    pub word_count: usize,
}

/// A full case as stored: metadata, markdown body and the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseData {
    pub meta: CaseMeta,
    pub content: String,
    pub version: Option<VersionToken>,
}

/// Caller-supplied fields for creating or updating a case.
///
/// `image` falls back to `/images/{id}-cover.jpg` and `tags` to an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseInput {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub date: String,
    pub tags: Option<Vec<String>>,
    pub content: String,
}

/// Metadata as it appears in a stored document. Every key is optional on read so that older
/// or hand-written documents still list.
#[derive(Debug, Default, Deserialize)]
struct StoredMetadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_string")]
    date: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Dates are normally strings, but hand-edited files sometimes carry bare numbers.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a date string, found {other:?}"
        ))),
    }
}

impl CaseMeta {
    /// Builds case metadata from a decoded metadata block. The id always comes from the
    /// storage key, never from the document.
    pub fn from_metadata(id: CaseId, metadata: &Metadata) -> Result<Self, FormatError> {
        let stored: StoredMetadata =
            serde_yaml::from_value(serde_yaml::Value::Mapping(metadata.clone()))
                .map_err(|e| FormatError::InvalidMetadata(e.to_string()))?;

        let image = stored
            .image
            .filter(|image| !image.trim().is_empty())
            .unwrap_or_else(|| default_image_for(id.as_str()));

        Ok(Self {
            title: stored.title.unwrap_or_default(),
            description: stored.description.unwrap_or_default(),
            image,
            date: stored.date.unwrap_or_default(),
            tags: stored.tags.unwrap_or_default(),
            id,
        })
    }

    /// Renders the metadata block written for this case, in a fixed key order.
    pub fn to_metadata(&self) -> Metadata {
        let mut m = Metadata::new();
        m.insert("id".into(), self.id.as_str().into());
        m.insert("title".into(), self.title.as_str().into());
        m.insert("description".into(), self.description.as_str().into());
        m.insert("image".into(), self.image.as_str().into());
        m.insert("date".into(), self.date.as_str().into());
        m.insert(
            "tags".into(),
            serde_yaml::Value::Sequence(
                self.tags.iter().map(|t| t.as_str().into()).collect(),
            ),
        );
        m
    }
}
