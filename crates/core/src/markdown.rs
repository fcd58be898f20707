//! Frontmatter codec for case documents.
//!
//! A case document is a YAML metadata block between two `---` delimiter lines, followed by a
//! free-form markdown body:
//!
//! ```text
//! ---
//! title: Fake parcel text
//! date: 2024-06-01
//! tags:
//!   - sms
//! ---
//! Body markdown, kept byte for byte.
//! ```
//!
//! [`decode`] and [`encode`] are inverse for any metadata that round-trips through YAML:
//! `decode(&encode(m, b)?)? == Document { metadata: m, body: b }`. Key order is preserved
//! (the metadata is an insertion-ordered [`serde_yaml::Mapping`]) so re-encoding a document
//! produces a stable, diff-friendly file.
//!
//! The codec does not check which keys are present; that is the store's job.

use crate::constants::FRONTMATTER_DELIMITER;

/// Metadata block of a document, in document order.
pub type Metadata = serde_yaml::Mapping;

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("frontmatter block opened with '---' but never closed")]
    Unterminated,
    #[error("frontmatter must be a key/value mapping")]
    NotAMapping,
    #[error("invalid YAML in frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
}

/// A decoded document: metadata plus the verbatim body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub metadata: Metadata,
    pub body: String,
}

/// Splits a raw document into its metadata mapping and body.
///
/// Content that does not start with a `---` line has no metadata and is returned whole as
/// the body. A leading byte order mark is ignored and delimiter lines may end in `\r\n`.
///
/// # Errors
///
/// - [`FormatError::Unterminated`] when the opening delimiter has no matching closing line
/// - [`FormatError::Yaml`] when the block is not valid YAML
/// - [`FormatError::NotAMapping`] when the block is valid YAML but not a mapping
pub fn decode(raw: &str) -> Result<Document, FormatError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let Some(after_open) = strip_delimiter_line(raw) else {
        return Ok(Document {
            metadata: Metadata::new(),
            body: raw.to_owned(),
        });
    };

    let mut offset = 0;
    loop {
        let rest = &after_open[offset..];
        if rest.is_empty() {
            return Err(FormatError::Unterminated);
        }
        if let Some(body) = strip_delimiter_line(rest) {
            let yaml = &after_open[..offset];
            return Ok(Document {
                metadata: parse_metadata(yaml)?,
                body: body.to_owned(),
            });
        }
        match rest.find('\n') {
            Some(pos) => offset += pos + 1,
            None => return Err(FormatError::Unterminated),
        }
    }
}

/// Serialises metadata and body into a document.
///
/// # Errors
///
/// Returns [`FormatError::Yaml`] if a metadata value cannot be represented in YAML.
pub fn encode(metadata: &Metadata, body: &str) -> Result<String, FormatError> {
    let yaml = if metadata.is_empty() {
        String::new()
    } else {
        serde_yaml::to_string(metadata)?
    };

    let mut out = String::with_capacity(yaml.len() + body.len() + 8);
    out.push_str(FRONTMATTER_DELIMITER);
    out.push('\n');
    out.push_str(&yaml);
    if !yaml.is_empty() && !yaml.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(FRONTMATTER_DELIMITER);
    out.push('\n');
    out.push_str(body);
    Ok(out)
}

/// If `text` starts with a delimiter line, returns everything after that line.
fn strip_delimiter_line(text: &str) -> Option<&str> {
    let (line, rest) = match text.find('\n') {
        Some(pos) => (&text[..pos], &text[pos + 1..]),
        None => (text, ""),
    };
    (line.trim_end() == FRONTMATTER_DELIMITER).then_some(rest)
}

fn parse_metadata(yaml: &str) -> Result<Metadata, FormatError> {
    if yaml.trim().is_empty() {
        return Ok(Metadata::new());
    }
    match serde_yaml::from_str::<serde_yaml::Value>(yaml)? {
        serde_yaml::Value::Mapping(mapping) => Ok(mapping),
        serde_yaml::Value::Null => Ok(Metadata::new()),
        _ => Err(FormatError::NotAMapping),
    }
}
