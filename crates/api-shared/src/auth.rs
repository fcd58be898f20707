//! Admin session credential.
//!
//! There is one admin and one shared password. A successful login yields a token of the
//! form `<payload>.<signature>`:
//!
//! - `payload` is the URL-safe base64 of `{"admin":true,"iat":..,"exp":..}` (unix seconds)
//! - `signature` is the hex HMAC-SHA256 of the encoded payload under the session secret
//!
//! The token travels in the `admin-token` cookie. Verification checks the signature in
//! constant time, then the `admin` flag, then expiry.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "admin-token";

/// Session lifetime when `SESSION_TTL_HOURS` is not set.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("{0} must be set")]
    MissingSetting(&'static str),
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
    #[error("invalid password")]
    InvalidPassword,
    #[error("malformed session token")]
    Malformed,
    #[error("session signature does not verify")]
    BadSignature,
    #[error("session has expired")]
    Expired,
    #[error("session is not an admin session")]
    NotAdmin,
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Admin authentication settings, resolved once at startup.
#[derive(Clone)]
pub struct AuthConfig {
    admin_password: String,
    session_secret: String,
    session_ttl_secs: i64,
    secure_cookies: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("secure_cookies", &self.secure_cookies)
            .finish_non_exhaustive()
    }
}

impl AuthConfig {
    pub fn new(
        admin_password: impl Into<String>,
        session_secret: impl Into<String>,
        session_ttl_hours: i64,
        secure_cookies: bool,
    ) -> SessionResult<Self> {
        let admin_password = admin_password.into();
        let session_secret = session_secret.into();
        if admin_password.is_empty() {
            return Err(SessionError::MissingSetting("ADMIN_PASSWORD"));
        }
        if session_secret.is_empty() {
            return Err(SessionError::MissingSetting("SESSION_SECRET"));
        }
        if session_ttl_hours <= 0 {
            return Err(SessionError::InvalidSetting(format!(
                "SESSION_TTL_HOURS must be positive, got {session_ttl_hours}"
            )));
        }
        Ok(Self {
            admin_password,
            session_secret,
            session_ttl_secs: session_ttl_hours * 3600,
            secure_cookies,
        })
    }

    pub fn session_ttl_secs(&self) -> i64 {
        self.session_ttl_secs
    }

    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    fn mac(&self) -> SessionResult<HmacSha256> {
        HmacSha256::new_from_slice(self.session_secret.as_bytes())
            .map_err(|e| SessionError::InvalidSetting(e.to_string()))
    }

    /// Compares `candidate` with the admin password without short-circuiting on the first
    /// differing byte.
    pub fn check_password(&self, candidate: &str) -> SessionResult<()> {
        let mut expected = self.mac()?;
        expected.update(self.admin_password.as_bytes());
        let expected = expected.finalize().into_bytes();

        let mut mac = self.mac()?;
        mac.update(candidate.as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| SessionError::InvalidPassword)
    }

    /// Issues a session token valid from `now` (unix seconds) for the configured lifetime.
    pub fn issue_session_token(&self, now: i64) -> SessionResult<String> {
        let claims = SessionClaims {
            admin: true,
            iat: now,
            exp: now + self.session_ttl_secs,
        };
        let payload = serde_json::to_vec(&claims)
            .map_err(|e| SessionError::InvalidSetting(e.to_string()))?;
        let payload_part = URL_SAFE_NO_PAD.encode(payload);

        let mut mac = self.mac()?;
        mac.update(payload_part.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(format!("{payload_part}.{signature}"))
    }

    /// Verifies a session token at time `now` (unix seconds).
    ///
    /// # Errors
    ///
    /// - [`SessionError::Malformed`] if the token does not have two parts or does not decode
    /// - [`SessionError::BadSignature`] if it was not signed with this secret
    /// - [`SessionError::NotAdmin`] / [`SessionError::Expired`] for valid but unusable claims
    pub fn verify_session_token(&self, token: &str, now: i64) -> SessionResult<SessionClaims> {
        let (payload_part, signature_part) =
            token.split_once('.').ok_or(SessionError::Malformed)?;
        let signature = hex::decode(signature_part).map_err(|_| SessionError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(payload_part.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SessionError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_part)
            .map_err(|_| SessionError::Malformed)?;
        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| SessionError::Malformed)?;

        if !claims.admin {
            return Err(SessionError::NotAdmin);
        }
        if claims.exp <= now {
            return Err(SessionError::Expired);
        }
        Ok(claims)
    }

    /// `Set-Cookie` value that stores `token`.
    pub fn session_cookie(&self, token: &str) -> String {
        self.cookie(token, self.session_ttl_secs)
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn clear_session_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: i64) -> String {
        let mut cookie =
            format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}");
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Finds the session token in a `Cookie` request header.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Parses `SESSION_TTL_HOURS`. Empty means the default.
pub fn session_ttl_from_env_value(value: Option<String>) -> SessionResult<i64> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(DEFAULT_SESSION_TTL_HOURS),
        Some(raw) => raw.parse().map_err(|_| {
            SessionError::InvalidSetting(format!("SESSION_TTL_HOURS must be a number, got '{raw}'"))
        }),
    }
}

/// Parses `SECURE_COOKIES`. Empty means `false`.
pub fn secure_cookies_from_env_value(value: Option<String>) -> SessionResult<bool> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("false") | Some("0") | Some("no") => Ok(false),
        Some("true") | Some("1") | Some("yes") => Ok(true),
        Some(other) => Err(SessionError::InvalidSetting(format!(
            "SECURE_COOKIES must be true or false, got '{other}'"
        ))),
    }
}

/// Builds the auth configuration from raw environment values.
pub fn auth_config_from_env_values(
    admin_password: Option<String>,
    session_secret: Option<String>,
    session_ttl_hours: Option<String>,
    secure_cookies: Option<String>,
) -> SessionResult<AuthConfig> {
    AuthConfig::new(
        admin_password.ok_or(SessionError::MissingSetting("ADMIN_PASSWORD"))?,
        session_secret.ok_or(SessionError::MissingSetting("SESSION_SECRET"))?,
        session_ttl_from_env_value(session_ttl_hours)?,
        secure_cookies_from_env_value(secure_cookies)?,
    )
}
