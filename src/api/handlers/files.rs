use crate::api::error::AppError;
use crate::api::middleware::auth::require_admin;
use crate::entities::{prelude::*, *};
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Internal responses keep the camelCase convention the web client was built
/// against; the external bridge exposes the snake_case one.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub id: String,
    pub original_filename: String,
    pub display_name: Option<String>,
    pub storage_file_id: Option<String>,
    pub total_questions: i32,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<files::Model> for FileResponse {
    fn from(f: files::Model) -> Self {
        Self {
            id: f.id,
            original_filename: f.original_filename,
            display_name: f.display_name,
            storage_file_id: f.storage_file_id,
            total_questions: f.total_questions,
            uploaded_by: f.uploaded_by,
            uploaded_at: f.uploaded_at,
            created_at: f.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedFilesResponse {
    pub documents: Vec<FileResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesQuery {
    pub search: Option<String>,
    /// "name", "questions" or "uploaded" (default)
    pub sort_by: Option<String>,
    /// "asc" or "desc" (default)
    pub sort_order: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFileRequest {
    #[validate(length(min = 1, message = "Display name is required"))]
    pub display_name: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadCsvResponse {
    pub file_id: String,
    pub question_count: usize,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergeCsvResponse {
    pub question_count: usize,
}

const DEFAULT_PAGE_SIZE: u64 = 25;

#[utoipa::path(
    get,
    path = "/files",
    params(
        ("search" = Option<String>, Query, description = "Filter by display name"),
        ("sortBy" = Option<String>, Query, description = "name | uploaded | questions"),
        ("sortOrder" = Option<String>, Query, description = "asc | desc"),
        ("page" = Option<u64>, Query, description = "1-based page"),
        ("pageSize" = Option<u64>, Query, description = "Page size (default 25)")
    ),
    responses(
        (status = 200, description = "Paginated list of question files", body = PaginatedFilesResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<crate::AppState>,
    Extension(_claims): Extension<Claims>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<PaginatedFilesResponse>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);

    let mut cond = Condition::all();
    if let Some(ref search) = query.search {
        if !search.is_empty() {
            cond = cond.add(files::Column::DisplayName.contains(search));
        }
    }

    let total = Files::find().filter(cond.clone()).count(&state.db).await?;

    let ascending = query.sort_order.as_deref() == Some("asc");
    let mut select = Files::find().filter(cond);
    select = match (query.sort_by.as_deref(), ascending) {
        (Some("name"), true) => select.order_by_asc(files::Column::DisplayName),
        (Some("name"), false) => select.order_by_desc(files::Column::DisplayName),
        (Some("questions"), true) => select.order_by_asc(files::Column::TotalQuestions),
        (Some("questions"), false) => select.order_by_desc(files::Column::TotalQuestions),
        (_, true) => select.order_by_asc(files::Column::UploadedAt),
        (_, false) => select.order_by_desc(files::Column::UploadedAt),
    };

    let items = select
        .limit(page_size)
        .offset((page - 1) * page_size)
        .all(&state.db)
        .await?;

    Ok(Json(PaginatedFilesResponse {
        documents: items.into_iter().map(FileResponse::from).collect(),
        total,
        page,
        page_size,
        total_pages: total.div_ceil(page_size),
    }))
}

#[utoipa::path(
    get,
    path = "/files/{id}",
    params(("id" = String, Path, description = "File ID")),
    responses(
        (status = 200, description = "File details", body = FileResponse),
        (status = 404, description = "File not found")
    ),
    security(("jwt" = [])),
    tag = "files"
)]
pub async fn get_file(
    State(state): State<crate::AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let file = Files::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    Ok(Json(file.into()))
}

#[utoipa::path(
    put,
    path = "/files/{id}",
    params(("id" = String, Path, description = "File ID")),
    request_body = UpdateFileRequest,
    responses(
        (status = 200, description = "File updated", body = FileResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "File not found")
    ),
    security(("jwt" = [])),
    tag = "files"
)]
pub async fn update_file(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateFileRequest>,
) -> Result<Json<FileResponse>, AppError> {
    require_admin(&claims)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let file = Files::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let mut model: files::ActiveModel = file.into();
    model.display_name = Set(Some(req.display_name));

    Ok(Json(model.update(&state.db).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/files/{id}",
    params(("id" = String, Path, description = "File ID")),
    responses(
        (status = 200, description = "File and all its questions deleted"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "File not found")
    ),
    security(("jwt" = [])),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&claims)?;

    state.bank.delete_file(&id).await?;

    Ok(Json(serde_json::json!({ "success": true })))
}

#[utoipa::path(
    post,
    path = "/files/upload-csv",
    request_body(content = Multipart, description = "CSV upload: file, displayName, convertZeroIndexed"),
    responses(
        (status = 200, description = "CSV ingested", body = UploadCsvResponse),
        (status = 400, description = "Invalid or empty CSV"),
        (status = 403, description = "Admin access required")
    ),
    security(("jwt" = [])),
    tag = "files"
)]
pub async fn upload_csv(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<UploadCsvResponse>, AppError> {
    require_admin(&claims)?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut display_name = String::new();
    let mut convert_zero_indexed = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("unnamed").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some((filename, data.to_vec()));
            }
            "displayName" => {
                display_name = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "convertZeroIndexed" => {
                convert_zero_indexed = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    == "true";
            }
            _ => {}
        }
    }

    let (filename, data) =
        file.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let outcome = state
        .bank
        .upload_csv(
            &filename,
            &display_name,
            convert_zero_indexed,
            data,
            &claims.sub,
        )
        .await?;

    Ok(Json(UploadCsvResponse {
        file_id: outcome.file_id,
        question_count: outcome.question_count,
    }))
}

#[utoipa::path(
    post,
    path = "/files/{id}/merge-csv",
    params(("id" = String, Path, description = "Target file ID")),
    request_body(content = Multipart, description = "CSV upload: file, convertZeroIndexed"),
    responses(
        (status = 200, description = "CSV merged", body = MergeCsvResponse),
        (status = 400, description = "Invalid or empty CSV"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "File not found")
    ),
    security(("jwt" = [])),
    tag = "files"
)]
pub async fn merge_csv(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<MergeCsvResponse>, AppError> {
    require_admin(&claims)?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut convert_zero_indexed = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("unnamed").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some((filename, data.to_vec()));
            }
            "convertZeroIndexed" => {
                convert_zero_indexed = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    == "true";
            }
            _ => {}
        }
    }

    let (filename, data) =
        file.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let question_count = state
        .bank
        .merge_csv(&id, &filename, convert_zero_indexed, data)
        .await?;

    Ok(Json(MergeCsvResponse { question_count }))
}
