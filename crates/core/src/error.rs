use crate::backend::BackendError;
use crate::markdown::FormatError;

/// Errors returned by the case store.
///
/// Backend and codec failures never escape unmapped: version mismatches and create races
/// become [`CaseError::Conflict`], absent documents become [`CaseError::NotFound`], and
/// everything else is carried as [`CaseError::Backend`].
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("case not found: {0}")]
    NotFound(String),
    #[error("malformed document: {0}")]
    Format(#[from] FormatError),
    #[error("storage backend failure: {0}")]
    Backend(BackendError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<BackendError> for CaseError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::VersionMismatch(name) => {
                CaseError::Conflict(format!("{name} was changed by someone else; reload and retry"))
            }
            BackendError::AlreadyExists(name) => {
                CaseError::Conflict(format!("{name} already exists"))
            }
            BackendError::NotFound(name) => CaseError::NotFound(name),
            other => CaseError::Backend(other),
        }
    }
}

impl From<casebook_types::CaseIdError> for CaseError {
    fn from(err: casebook_types::CaseIdError) -> Self {
        CaseError::Validation(err.to_string())
    }
}

pub type CaseResult<T> = std::result::Result<T, CaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_mismatch_maps_to_conflict() {
        let err: CaseError = BackendError::VersionMismatch("a.md".into()).into();
        assert!(matches!(err, CaseError::Conflict(_)));
    }

    #[test]
    fn already_exists_maps_to_conflict() {
        let err: CaseError = BackendError::AlreadyExists("a.md".into()).into();
        assert!(matches!(err, CaseError::Conflict(_)));
    }

    #[test]
    fn missing_maps_to_not_found() {
        let err: CaseError = BackendError::NotFound("a.md".into()).into();
        assert!(matches!(err, CaseError::NotFound(name) if name == "a.md"));
    }

    #[test]
    fn io_stays_backend_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CaseError = BackendError::Io(io).into();
        assert!(matches!(err, CaseError::Backend(BackendError::Io(_))));
    }
}
