use crate::api::error::AppError;
use crate::api::middleware::auth::require_admin;
use crate::utils::auth::Claims;
use crate::utils::validation::validate_image;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    pub file_id: String,
    pub url: String,
}

#[utoipa::path(
    post,
    path = "/images",
    request_body(content = Multipart, description = "Image upload: file"),
    responses(
        (status = 200, description = "Image stored", body = ImageUploadResponse),
        (status = 400, description = "Not an accepted image type or too large"),
        (status = 403, description = "Admin access required")
    ),
    security(("jwt" = [])),
    tag = "images"
)]
pub async fn upload_image(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<ImageUploadResponse>, AppError> {
    require_admin(&claims)?;

    let mut data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            data = Some(bytes.to_vec());
        }
    }

    let data = data.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let mime = validate_image(&data, state.config.max_image_size)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let bucket = &state.config.question_images_bucket;
    let key = Uuid::new_v4().to_string();

    state
        .storage
        .upload_file(bucket, &key, data, mime)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let url = state.storage.get_view_url(bucket, &key);

    Ok(Json(ImageUploadResponse { file_id: key, url }))
}

#[utoipa::path(
    delete,
    path = "/images/{id}",
    params(("id" = String, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Image deleted"),
        (status = 403, description = "Admin access required")
    ),
    security(("jwt" = [])),
    tag = "images"
)]
pub async fn delete_image(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&claims)?;

    state
        .storage
        .delete_file(&state.config.question_images_bucket, &id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(serde_json::json!({ "success": true })))
}
