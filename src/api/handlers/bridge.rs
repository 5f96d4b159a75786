use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::storage::StorageService;
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// External consumers page through at most this many files/questions.
const BRIDGE_FILES_LIMIT: u64 = 100;
const BRIDGE_QUESTIONS_LIMIT: u64 = 500;

#[derive(Deserialize)]
pub struct BridgeQuery {
    pub token: Option<String>,
    pub route: Option<String>,
    pub file_id: Option<String>,
    pub id: Option<String>,
}

/// File record in the externally-stable snake_case convention.
#[derive(Serialize, ToSchema)]
pub struct ExternalFile {
    pub id: String,
    pub original_filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub total_questions: i32,
    pub display_name: String,
}

impl From<files::Model> for ExternalFile {
    fn from(f: files::Model) -> Self {
        Self {
            id: f.id,
            display_name: f
                .display_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| f.original_filename.clone()),
            original_filename: f.original_filename,
            uploaded_at: f.uploaded_at,
            total_questions: f.total_questions,
        }
    }
}

/// Question record in the externally-stable snake_case convention. Image ids
/// are exposed both raw and as resolved view URLs; the URLs are empty strings
/// when absent, never null.
#[derive(Serialize, ToSchema)]
pub struct ExternalQuestion {
    pub id: String,
    pub file_id: String,
    pub question_text: String,
    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,
    pub option5: String,
    pub answer: String,
    pub explanation: String,
    pub question_image: Option<String>,
    pub explanation_image: Option<String>,
    pub question_image_url: String,
    pub explanation_image_url: String,
    #[serde(rename = "type")]
    pub question_type: i32,
    pub section: String,
    pub order_index: i32,
    pub created_at: Option<DateTime<Utc>>,
}

fn map_question(q: questions::Model, storage: &dyn StorageService, bucket: &str) -> ExternalQuestion {
    let image_url = |id: &Option<String>| {
        id.as_deref()
            .map(|key| storage.get_view_url(bucket, key))
            .unwrap_or_default()
    };

    ExternalQuestion {
        question_image_url: image_url(&q.question_image_id),
        explanation_image_url: image_url(&q.explanation_image_id),
        id: q.id,
        file_id: q.file_id,
        question_text: q.question_text,
        option1: q.option1,
        option2: q.option2,
        option3: q.option3,
        option4: q.option4,
        option5: q.option5,
        answer: q.answer,
        explanation: q.explanation,
        question_image: q.question_image_id,
        explanation_image: q.explanation_image_id,
        question_type: q.question_type,
        section: q.section,
        order_index: q.order_index,
        created_at: q.created_at,
    }
}

/// Rejects before any gateway access; the bridge is a system-to-system
/// credential with no per-user identity.
fn check_token(state: &crate::AppState, token: &Option<String>) -> Result<(), AppError> {
    match token {
        Some(token) if *token == state.config.api_secret_token => Ok(()),
        _ => Err(AppError::Unauthorized(
            "Invalid or missing API Token".to_string(),
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/questions",
    params(
        ("token" = String, Query, description = "Shared secret token"),
        ("route" = String, Query, description = "files | questions | question"),
        ("file_id" = Option<String>, Query, description = "Filter questions by file"),
        ("id" = Option<String>, Query, description = "Question id for route=question")
    ),
    responses(
        (status = 200, description = "Records in the external snake_case shape"),
        (status = 401, description = "Invalid or missing API Token"),
        (status = 404, description = "Unknown route or record")
    ),
    tag = "bridge"
)]
pub async fn bridge_get(
    State(state): State<crate::AppState>,
    Query(query): Query<BridgeQuery>,
) -> Result<Json<Value>, AppError> {
    check_token(&state, &query.token)?;

    let bucket = &state.config.question_images_bucket;

    match query.route.as_deref() {
        Some("files") => {
            let files = Files::find()
                .order_by_desc(files::Column::UploadedAt)
                .limit(BRIDGE_FILES_LIMIT)
                .all(&state.db)
                .await?;

            let mapped: Vec<ExternalFile> = files.into_iter().map(ExternalFile::from).collect();
            Ok(Json(serde_json::to_value(mapped).map_err(|e| {
                AppError::Internal(e.to_string())
            })?))
        }

        Some("questions") => {
            let mut select = Questions::find()
                .order_by_asc(questions::Column::OrderIndex)
                .limit(BRIDGE_QUESTIONS_LIMIT);

            if let Some(ref file_id) = query.file_id {
                select = select.filter(questions::Column::FileId.eq(file_id));
            }

            let questions = select.all(&state.db).await?;

            let mapped: Vec<ExternalQuestion> = questions
                .into_iter()
                .map(|q| map_question(q, state.storage.as_ref(), bucket))
                .collect();
            Ok(Json(serde_json::to_value(mapped).map_err(|e| {
                AppError::Internal(e.to_string())
            })?))
        }

        Some("question") => {
            let id = query
                .id
                .ok_or_else(|| AppError::BadRequest("Missing question ID".to_string()))?;

            let question = Questions::find_by_id(id)
                .one(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

            let mapped = map_question(question, state.storage.as_ref(), bucket);
            Ok(Json(serde_json::to_value(mapped).map_err(|e| {
                AppError::Internal(e.to_string())
            })?))
        }

        _ => Err(AppError::NotFound(
            "Route not found or not specified".to_string(),
        )),
    }
}

/// Coerces a JSON value to a number the way the legacy consumer expects:
/// numbers pass through, numeric strings parse, everything else is 0.
fn coerce_i32(value: &Value) -> i32 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or(0) as i32,
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Coerces a JSON value to a string regardless of its actual type.
fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[utoipa::path(
    post,
    path = "/api/questions",
    params(
        ("token" = String, Query, description = "Shared secret token"),
        ("route" = String, Query, description = "update-question")
    ),
    responses(
        (status = 200, description = "Question updated"),
        (status = 400, description = "Invalid route or missing id"),
        (status = 401, description = "Invalid or missing API Token"),
        (status = 404, description = "Question not found")
    ),
    tag = "bridge"
)]
pub async fn bridge_post(
    State(state): State<crate::AppState>,
    Query(query): Query<BridgeQuery>,
    Json(input): Json<Value>,
) -> Result<Json<Value>, AppError> {
    check_token(&state, &query.token)?;

    if query.route.as_deref() != Some("update-question") {
        return Err(AppError::BadRequest("Invalid route for POST".to_string()));
    }

    let id = input
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::BadRequest("Missing question ID".to_string()))?;

    let question = Questions::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    let mut model: questions::ActiveModel = question.into();

    // Translate recognized snake_case fields back to the internal shape;
    // unrecognized fields are ignored.
    let text_fields: [(&str, fn(&mut questions::ActiveModel, String)); 8] = [
        ("question_text", |m, v| m.question_text = Set(v)),
        ("option1", |m, v| m.option1 = Set(v)),
        ("option2", |m, v| m.option2 = Set(v)),
        ("option3", |m, v| m.option3 = Set(v)),
        ("option4", |m, v| m.option4 = Set(v)),
        ("option5", |m, v| m.option5 = Set(v)),
        ("answer", |m, v| m.answer = Set(v)),
        ("explanation", |m, v| m.explanation = Set(v)),
    ];

    for (key, apply) in text_fields {
        if let Some(value) = input.get(key) {
            if !value.is_null() {
                apply(&mut model, coerce_string(value));
            }
        }
    }

    if let Some(value) = input.get("type") {
        if !value.is_null() {
            model.question_type = Set(coerce_i32(value));
        }
    }
    if let Some(value) = input.get("section") {
        if !value.is_null() {
            model.section = Set(coerce_string(value));
        }
    }

    model.update(&state.db).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Question updated"
    })))
}
