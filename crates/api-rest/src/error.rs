use api_shared::{ErrorRes, SessionError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use casebook_core::CaseError;

/// An unsuccessful response: a status code and a short message rendered as
/// `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<CaseError> for ApiError {
    fn from(err: CaseError) -> Self {
        match err {
            CaseError::Validation(msg) => Self::bad_request(msg),
            CaseError::Format(e) => Self::bad_request(format!("malformed document: {e}")),
            CaseError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            CaseError::NotFound(id) => Self::new(StatusCode::NOT_FOUND, format!("case not found: {id}")),
            other @ (CaseError::Backend(_) | CaseError::InvalidConfig(_)) => {
                tracing::error!("case storage error: {other}");
                Self::internal()
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidPassword => Self::new(StatusCode::UNAUTHORIZED, "Invalid password"),
            SessionError::MissingSetting(_) | SessionError::InvalidSetting(_) => {
                tracing::error!("session configuration error: {err}");
                Self::internal()
            }
            _ => Self::unauthorized(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorRes { error: self.message })).into_response()
    }
}
