//! Input validation utilities.
//!
//! Required-field checks for case input, applied before anything is written. The codec itself
//! never validates; a stored document may lack fields, but the store will not create one.

use crate::case::{CaseInput, CaseMeta};
use crate::constants::default_image_for;
use crate::markdown::Metadata;
use crate::{CaseError, CaseResult};
use casebook_types::{CaseId, NonEmptyText};

/// Checks that `date` starts with an ISO-8601 calendar date (`YYYY-MM-DD`).
///
/// Listings sort dates as strings, which is only meaningful for this layout.
pub fn validate_iso_date(date: &str) -> CaseResult<()> {
    let bytes = date.as_bytes();
    let ok = bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit);
    if ok {
        Ok(())
    } else {
        Err(CaseError::Validation(format!(
            "date must be an ISO-8601 date (YYYY-MM-DD), got '{date}'"
        )))
    }
}

fn missing_fields_error(missing: &[&str]) -> CaseError {
    CaseError::Validation(format!("missing required fields: {}", missing.join(", ")))
}

/// Validates caller input and builds the metadata that will be stored for `id`.
///
/// `title`, `description`, `date` and `content` must be non-empty. Text fields are trimmed,
/// empty tags are dropped, and a blank `image` falls back to the cover image convention.
///
/// # Errors
///
/// Returns [`CaseError::Validation`] naming every missing field, or describing a malformed
/// date.
pub fn validate_case_input(id: &CaseId, input: &CaseInput) -> CaseResult<CaseMeta> {
    let title = NonEmptyText::new(&input.title);
    let description = NonEmptyText::new(&input.description);
    let date = NonEmptyText::new(&input.date);

    let mut missing = Vec::new();
    if title.is_err() {
        missing.push("title");
    }
    if description.is_err() {
        missing.push("description");
    }
    if date.is_err() {
        missing.push("date");
    }
    if input.content.trim().is_empty() {
        missing.push("content");
    }

    let (Ok(title), Ok(description), Ok(date), true) =
        (title, description, date, missing.is_empty())
    else {
        return Err(missing_fields_error(&missing));
    };
    validate_iso_date(date.as_str())?;

    let image = input
        .image
        .as_deref()
        .and_then(|image| NonEmptyText::new(image).ok())
        .map(NonEmptyText::into_inner)
        .unwrap_or_else(|| default_image_for(id.as_str()));

    let tags = input
        .tags
        .iter()
        .flatten()
        .filter_map(|tag| NonEmptyText::new(tag).ok())
        .map(NonEmptyText::into_inner)
        .collect();

    Ok(CaseMeta {
        id: id.clone(),
        title: title.into_inner(),
        description: description.into_inner(),
        image,
        date: date.into_inner(),
        tags,
    })
}

/// Validates the frontmatter of an uploaded document and returns its case id.
///
/// Uploads must name their own `id` and carry `title`, `description` and `date`.
pub fn validate_upload_metadata(metadata: &Metadata) -> CaseResult<CaseId> {
    let field = |key: &str| {
        metadata
            .get(key)
            .and_then(serde_yaml::Value::as_str)
            .and_then(|value| NonEmptyText::new(value).ok())
    };

    let missing: Vec<&str> = ["id", "title", "description", "date"]
        .into_iter()
        .filter(|key| field(*key).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(missing_fields_error(&missing));
    }

    if let Some(date) = field("date") {
        validate_iso_date(date.as_str())?;
    }
    let id = field("id").map(NonEmptyText::into_inner).unwrap_or_default();
    Ok(CaseId::parse(id)?)
}
