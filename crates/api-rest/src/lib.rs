//! # API REST
//!
//! REST API implementation for the casebook.
//!
//! Handles:
//! - HTTP endpoints with axum, public and admin
//! - The admin session guard
//! - OpenAPI/Swagger documentation
//!
//! Uses `api-shared` for request/response models and session tokens, and `casebook-core`
//! for everything that touches cases.

#![warn(rust_2018_idioms)]

mod cases;
mod error;
mod session;

pub use error::ApiError;

use api_shared::{
    AdminCaseRes, AuthConfig, CaseDetailRes, CaseMetaRes, CaseSummaryRes, CreateCaseReq,
    ErrorRes, HealthRes, HealthService, LoginReq, SuccessRes, UpdateCaseReq,
};
use axum::extract::State;
use axum::middleware::from_fn_with_state;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use casebook_core::CaseDirectory;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state for the REST API server
///
/// Contains the services shared by every request handler. Cloning is cheap: the store
/// holds its backend behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub directory: CaseDirectory,
    pub auth: Arc<AuthConfig>,
    pub health: HealthService,
}

impl AppState {
    pub fn new(directory: CaseDirectory, auth: AuthConfig) -> Self {
        let health = HealthService::new(directory.store().describe());
        Self {
            directory,
            auth: Arc::new(auth),
            health,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        cases::list_cases,
        cases::get_case,
        session::login,
        session::logout,
        cases::admin_list_cases,
        cases::create_case,
        cases::admin_get_case,
        cases::update_case,
        cases::delete_case,
        cases::upload_case,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        SuccessRes,
        LoginReq,
        CaseSummaryRes,
        CaseDetailRes,
        CaseMetaRes,
        AdminCaseRes,
        CreateCaseReq,
        UpdateCaseReq,
    ))
)]
pub struct ApiDoc;

/// Builds the full router: public routes, admin routes behind the session guard, and the
/// OpenAPI document with Swagger UI.
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route(
            "/api/admin/cases",
            get(cases::admin_list_cases).post(cases::create_case),
        )
        .route(
            "/api/admin/cases/:id",
            get(cases::admin_get_case)
                .put(cases::update_case)
                .delete(cases::delete_case),
        )
        .route("/api/admin/upload", post(cases::upload_case))
        .route_layer(from_fn_with_state(state.clone(), session::require_admin));

    Router::new()
        .route("/health", get(health))
        .route("/api/cases", get(cases::list_cases))
        .route("/api/cases/:id", get(cases::get_case))
        .route(
            "/api/admin/auth",
            post(session::login).delete(session::logout),
        )
        .merge(admin)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks. Reports which storage backend the
/// server was started with.
#[axum::debug_handler]
async fn health(State(state): State<AppState>) -> Json<HealthRes> {
    Json(state.health.check_health_instance())
}
