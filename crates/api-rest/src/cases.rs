//! Case endpoints, public and admin.

use crate::error::ApiError;
use crate::AppState;
use api_shared::{
    AdminCaseRes, CaseDetailRes, CaseMetaRes, CaseSummaryRes, CreateCaseReq, DeleteCaseQuery,
    ErrorRes, ListCasesQuery, SuccessRes, UpdateCaseReq,
};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use casebook_core::constants::CASE_FILE_EXTENSION;
use casebook_core::render::render_html;
use casebook_core::{CaseId, VersionToken};

fn summaries(list: Vec<casebook_core::CaseSummary>) -> Json<Vec<CaseSummaryRes>> {
    Json(list.into_iter().map(CaseSummaryRes::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/cases",
    params(ListCasesQuery),
    responses(
        (status = 200, description = "Cases, newest first", body = [CaseSummaryRes]),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Lists published cases, newest first. With `limit`, only the most recent ones.
#[axum::debug_handler]
pub(crate) async fn list_cases(
    State(state): State<AppState>,
    Query(query): Query<ListCasesQuery>,
) -> Result<Json<Vec<CaseSummaryRes>>, ApiError> {
    let list = match query.limit {
        Some(n) => state.directory.latest(n).await?,
        None => state.directory.list_sorted().await?,
    };
    Ok(summaries(list))
}

#[utoipa::path(
    get,
    path = "/api/cases/{id}",
    params(("id" = String, Path, description = "Case id")),
    responses(
        (status = 200, description = "The case with its body rendered to HTML", body = CaseDetailRes),
        (status = 404, description = "No such case", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_case(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CaseDetailRes>, ApiError> {
    // An id that could never have been stored is simply not there.
    let id = CaseId::parse(&id)
        .map_err(|_| ApiError::new(StatusCode::NOT_FOUND, format!("case not found: {id}")))?;
    let data = state.directory.store().get(&id).await?;
    let html = render_html(&data.content);
    Ok(Json(CaseDetailRes::new(data, html)))
}

#[utoipa::path(
    get,
    path = "/api/admin/cases",
    responses(
        (status = 200, description = "All cases with word counts, newest first", body = [CaseSummaryRes]),
        (status = 401, description = "Not logged in", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn admin_list_cases(
    State(state): State<AppState>,
) -> Result<Json<Vec<CaseSummaryRes>>, ApiError> {
    Ok(summaries(state.directory.list_sorted().await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/cases",
    request_body = CreateCaseReq,
    responses(
        (status = 201, description = "Case created", body = CaseMetaRes),
        (status = 400, description = "Missing or invalid fields", body = ErrorRes),
        (status = 401, description = "Not logged in", body = ErrorRes),
        (status = 409, description = "A case with this id exists", body = ErrorRes)
    )
)]
/// Creates a case.
///
/// # Errors
/// Returns `400` when a required field is empty, `409` when the id is taken and `500` when
/// storage fails.
#[axum::debug_handler]
pub(crate) async fn create_case(
    State(state): State<AppState>,
    Json(req): Json<CreateCaseReq>,
) -> Result<(StatusCode, Json<CaseMetaRes>), ApiError> {
    let (id, input) = req.into_parts();
    let id = CaseId::parse(id).map_err(casebook_core::CaseError::from)?;
    let meta = state.directory.store().create(&id, &input).await?;
    Ok((StatusCode::CREATED, Json(meta.into())))
}

#[utoipa::path(
    get,
    path = "/api/admin/cases/{id}",
    params(("id" = String, Path, description = "Case id")),
    responses(
        (status = 200, description = "The case with its markdown body and version", body = AdminCaseRes),
        (status = 401, description = "Not logged in", body = ErrorRes),
        (status = 404, description = "No such case", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn admin_get_case(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AdminCaseRes>, ApiError> {
    let id = CaseId::parse(id).map_err(casebook_core::CaseError::from)?;
    let data = state.directory.store().get(&id).await?;
    Ok(Json(data.into()))
}

#[utoipa::path(
    put,
    path = "/api/admin/cases/{id}",
    params(("id" = String, Path, description = "Case id")),
    request_body = UpdateCaseReq,
    responses(
        (status = 200, description = "Case updated", body = CaseMetaRes),
        (status = 400, description = "Missing or invalid fields", body = ErrorRes),
        (status = 401, description = "Not logged in", body = ErrorRes),
        (status = 404, description = "No such case", body = ErrorRes),
        (status = 409, description = "The case changed since it was read", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_case(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCaseReq>,
) -> Result<Json<CaseMetaRes>, ApiError> {
    let id = CaseId::parse(id).map_err(casebook_core::CaseError::from)?;
    let (input, version) = req.into_parts();
    let meta = state.directory.store().update(&id, &input, version).await?;
    Ok(Json(meta.into()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/cases/{id}",
    params(("id" = String, Path, description = "Case id"), DeleteCaseQuery),
    responses(
        (status = 200, description = "Case deleted", body = SuccessRes),
        (status = 401, description = "Not logged in", body = ErrorRes),
        (status = 404, description = "No such case", body = ErrorRes),
        (status = 409, description = "The case changed since it was read", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_case(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteCaseQuery>,
) -> Result<Json<SuccessRes>, ApiError> {
    let id = CaseId::parse(id).map_err(casebook_core::CaseError::from)?;
    let version = query.version.map(VersionToken::new);
    state.directory.store().delete(&id, version).await?;
    Ok(Json(SuccessRes::ok()))
}

#[utoipa::path(
    post,
    path = "/api/admin/upload",
    request_body(content = String, content_type = "multipart/form-data", description = "A `.md` document in the `file` field"),
    responses(
        (status = 201, description = "Case imported", body = CaseMetaRes),
        (status = 400, description = "Not a markdown file, or incomplete frontmatter", body = ErrorRes),
        (status = 401, description = "Not logged in", body = ErrorRes),
        (status = 409, description = "A case with this id exists", body = ErrorRes)
    )
)]
/// Imports an uploaded markdown document as a new case, stored exactly as uploaded.
#[axum::debug_handler]
pub(crate) async fn upload_case(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CaseMetaRes>), ApiError> {
    let suffix = format!(".{CASE_FILE_EXTENSION}");
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_owned();
        if !file_name.ends_with(&suffix) {
            return Err(ApiError::bad_request("only .md files are accepted"));
        }
        let raw = field
            .text()
            .await
            .map_err(|e| ApiError::bad_request(format!("invalid upload: {e}")))?;
        let meta = state.directory.store().import(&raw).await?;
        tracing::info!("uploaded {file_name} as case {}", meta.id);
        return Ok((StatusCode::CREATED, Json(meta.into())));
    }
    Err(ApiError::bad_request("no file uploaded"))
}
