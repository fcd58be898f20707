//! # API Shared
//!
//! Shared utilities and definitions for the casebook APIs.
//!
//! Contains:
//! - Request and response models with OpenAPI schemas (`models` module)
//! - Shared services like `HealthService`
//! - The admin session credential (`auth` module)
//!
//! Used by `api-rest` and the server binary.

pub mod auth;
pub mod health;
pub mod models;

pub use auth::{AuthConfig, SessionError};
pub use health::HealthService;
pub use models::*;
