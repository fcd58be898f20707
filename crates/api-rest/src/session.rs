//! Admin login, logout and the guard in front of the admin routes.

use crate::error::ApiError;
use crate::AppState;
use api_shared::auth::token_from_cookie_header;
use api_shared::{ErrorRes, LoginReq, SuccessRes};
use axum::extract::{Request, State};
use axum::http::{header, HeaderName};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// A JSON success body with a `Set-Cookie` header.
type WithCookie = ([(HeaderName, String); 1], Json<SuccessRes>);

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[utoipa::path(
    post,
    path = "/api/admin/auth",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = SuccessRes),
        (status = 401, description = "Invalid password", body = ErrorRes)
    )
)]
/// Exchanges the admin password for a session cookie.
#[axum::debug_handler]
pub(crate) async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> Result<WithCookie, ApiError> {
    if let Err(err) = state.auth.check_password(&req.password) {
        tracing::warn!("admin login rejected");
        return Err(err.into());
    }
    let token = state.auth.issue_session_token(now())?;
    tracing::info!("admin logged in");
    Ok((
        [(header::SET_COOKIE, state.auth.session_cookie(&token))],
        Json(SuccessRes::ok()),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/admin/auth",
    responses(
        (status = 200, description = "Logged out; session cookie cleared", body = SuccessRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn logout(State(state): State<AppState>) -> WithCookie {
    (
        [(header::SET_COOKIE, state.auth.clear_session_cookie())],
        Json(SuccessRes::ok()),
    )
}

/// Rejects requests without a valid admin session cookie.
pub(crate) async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let now = now();
    let authorised = request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(token_from_cookie_header)
        .any(|token| match state.auth.verify_session_token(token, now) {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!("session rejected: {err}");
                false
            }
        });

    if !authorised {
        return ApiError::unauthorized().into_response();
    }
    next.run(request).await
}
