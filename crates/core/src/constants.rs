//! Constants used throughout the casebook core crate.
//!
//! This module contains path, filename and naming conventions so that both backends and the
//! store agree on how a case maps onto a stored document.

/// Default directory for case documents when no explicit directory is configured.
pub const DEFAULT_CASES_DIR: &str = "data/cases";

/// File extension (without the dot) of stored case documents.
pub const CASE_FILE_EXTENSION: &str = "md";

/// Default GitHub REST API base URL.
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

/// Default subdirectory of the remote repository that holds case documents.
pub const DEFAULT_GITHUB_CASES_PATH: &str = "cases";

/// Media type requested from the GitHub contents API.
pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// User agent sent with every GitHub request (the API rejects requests without one).
pub const GITHUB_USER_AGENT: &str = concat!("casebook/", env!("CARGO_PKG_VERSION"));

/// Opening and closing delimiter line of the frontmatter block.
pub const FRONTMATTER_DELIMITER: &str = "---";

/// Number of cases returned by `latest` when the caller does not ask for a specific count.
pub const DEFAULT_LATEST_COUNT: usize = 6;

/// Builds the default cover image URL for a case.
pub fn default_image_for(id: &str) -> String {
    format!("/images/{id}-cover.jpg")
}

/// Builds the stored file name for a case id.
pub fn file_name_for(id: &str) -> String {
    format!("{id}.{CASE_FILE_EXTENSION}")
}

/// Returns the id stem of a stored file name, or `None` when it is not a case document.
pub fn id_from_file_name(name: &str) -> Option<&str> {
    name.strip_suffix(CASE_FILE_EXTENSION)
        .and_then(|stem| stem.strip_suffix('.'))
        .filter(|stem| !stem.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_and_id_are_inverse() {
        assert_eq!(file_name_for("scam-1"), "scam-1.md");
        assert_eq!(id_from_file_name("scam-1.md"), Some("scam-1"));
    }

    #[test]
    fn id_from_file_name_ignores_other_files() {
        assert_eq!(id_from_file_name("readme.txt"), None);
        assert_eq!(id_from_file_name(".md"), None);
        assert_eq!(id_from_file_name("notmd"), None);
    }

    #[test]
    fn default_image_follows_convention() {
        assert_eq!(default_image_for("abc"), "/images/abc-cover.jpg");
    }
}
