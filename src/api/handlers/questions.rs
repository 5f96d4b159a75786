use crate::api::error::AppError;
use crate::api::middleware::auth::require_admin;
use crate::entities::{prelude::*, *};
use crate::services::bank_service::{NewQuestion, QuestionUpdate};
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
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
    pub question_image_id: Option<String>,
    pub explanation_image_id: Option<String>,
    #[serde(rename = "type")]
    pub question_type: i32,
    pub section: String,
    pub order_index: i32,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<questions::Model> for QuestionResponse {
    fn from(q: questions::Model) -> Self {
        Self {
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
            question_image_id: q.question_image_id,
            explanation_image_id: q.explanation_image_id,
            question_type: q.question_type,
            section: q.section,
            order_index: q.order_index,
            created_at: q.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedQuestionsResponse {
    pub documents: Vec<QuestionResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuestionsQuery {
    pub file_id: Option<String>,
    pub section: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<i32>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub file_id: String,
    pub question_text: String,
    #[serde(default)]
    pub option1: String,
    #[serde(default)]
    pub option2: String,
    #[serde(default)]
    pub option3: String,
    #[serde(default)]
    pub option4: String,
    #[serde(default)]
    pub option5: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub question_image_id: Option<String>,
    #[serde(default)]
    pub explanation_image_id: Option<String>,
    #[serde(default, rename = "type")]
    pub question_type: i32,
    #[serde(default = "default_section")]
    pub section: String,
    #[serde(default)]
    pub order_index: i32,
}

fn default_section() -> String {
    "0".to_string()
}

/// Absent fields stay untouched; image ids distinguish absent (untouched)
/// from null (cleared).
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    pub question_text: Option<String>,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub option3: Option<String>,
    pub option4: Option<String>,
    pub option5: Option<String>,
    pub answer: Option<String>,
    pub explanation: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub question_image_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub explanation_image_id: Option<Option<String>>,
    #[serde(rename = "type")]
    pub question_type: Option<i32>,
    pub section: Option<String>,
}

/// Maps a present-but-null JSON value to `Some(None)` so partial updates can
/// clear an image reference, while an absent key stays `None`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub question_ids: Vec<String>,
}

const DEFAULT_PAGE_SIZE: u64 = 25;

#[utoipa::path(
    get,
    path = "/questions",
    params(
        ("fileId" = Option<String>, Query, description = "Filter by owning file"),
        ("section" = Option<String>, Query, description = "Filter by section code"),
        ("type" = Option<i32>, Query, description = "Filter by question type"),
        ("search" = Option<String>, Query, description = "Filter by question text"),
        ("page" = Option<u64>, Query, description = "1-based page"),
        ("pageSize" = Option<u64>, Query, description = "Page size (default 25)")
    ),
    responses(
        (status = 200, description = "Paginated questions ordered by orderIndex", body = PaginatedQuestionsResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "questions"
)]
pub async fn list_questions(
    State(state): State<crate::AppState>,
    Extension(_claims): Extension<Claims>,
    Query(query): Query<ListQuestionsQuery>,
) -> Result<Json<PaginatedQuestionsResponse>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);

    let mut cond = Condition::all();
    if let Some(ref file_id) = query.file_id {
        cond = cond.add(questions::Column::FileId.eq(file_id));
    }
    // "0" means no section filter.
    if let Some(ref section) = query.section {
        if section != "0" {
            cond = cond.add(questions::Column::Section.eq(section));
        }
    }
    if let Some(question_type) = query.question_type {
        cond = cond.add(questions::Column::QuestionType.eq(question_type));
    }
    if let Some(ref search) = query.search {
        if !search.is_empty() {
            cond = cond.add(questions::Column::QuestionText.contains(search));
        }
    }

    let total = Questions::find()
        .filter(cond.clone())
        .count(&state.db)
        .await?;

    let items = Questions::find()
        .filter(cond)
        .order_by_asc(questions::Column::OrderIndex)
        .limit(page_size)
        .offset((page - 1) * page_size)
        .all(&state.db)
        .await?;

    Ok(Json(PaginatedQuestionsResponse {
        documents: items.into_iter().map(QuestionResponse::from).collect(),
        total,
        page,
        page_size,
        total_pages: total.div_ceil(page_size),
    }))
}

#[utoipa::path(
    get,
    path = "/questions/{id}",
    params(("id" = String, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Question details", body = QuestionResponse),
        (status = 404, description = "Question not found")
    ),
    security(("jwt" = [])),
    tag = "questions"
)]
pub async fn get_question(
    State(state): State<crate::AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<QuestionResponse>, AppError> {
    let question = Questions::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(question.into()))
}

#[utoipa::path(
    post,
    path = "/questions",
    request_body = CreateQuestionRequest,
    responses(
        (status = 200, description = "Question created", body = QuestionResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "File not found")
    ),
    security(("jwt" = [])),
    tag = "questions"
)]
pub async fn create_question(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateQuestionRequest>,
) -> Result<Json<QuestionResponse>, AppError> {
    require_admin(&claims)?;

    let created = state
        .bank
        .create_question(NewQuestion {
            file_id: req.file_id,
            question_text: req.question_text,
            option1: req.option1,
            option2: req.option2,
            option3: req.option3,
            option4: req.option4,
            option5: req.option5,
            answer: req.answer,
            explanation: req.explanation,
            question_image_id: req.question_image_id,
            explanation_image_id: req.explanation_image_id,
            question_type: req.question_type,
            section: req.section,
            order_index: req.order_index,
        })
        .await?;

    Ok(Json(created.into()))
}

#[utoipa::path(
    put,
    path = "/questions/{id}",
    params(("id" = String, Path, description = "Question ID")),
    request_body = UpdateQuestionRequest,
    responses(
        (status = 200, description = "Question updated", body = QuestionResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Question not found")
    ),
    security(("jwt" = [])),
    tag = "questions"
)]
pub async fn update_question(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateQuestionRequest>,
) -> Result<Json<QuestionResponse>, AppError> {
    require_admin(&claims)?;

    let updated = state
        .bank
        .update_question(
            &id,
            QuestionUpdate {
                question_text: req.question_text,
                option1: req.option1,
                option2: req.option2,
                option3: req.option3,
                option4: req.option4,
                option5: req.option5,
                answer: req.answer,
                explanation: req.explanation,
                question_image_id: req.question_image_id,
                explanation_image_id: req.explanation_image_id,
                question_type: req.question_type,
                section: req.section,
            },
        )
        .await?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/questions/{id}",
    params(("id" = String, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Question deleted"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Question not found")
    ),
    security(("jwt" = [])),
    tag = "questions"
)]
pub async fn delete_question(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&claims)?;

    state.bank.delete_question(&id).await?;

    Ok(Json(serde_json::json!({ "success": true })))
}

#[utoipa::path(
    put,
    path = "/files/{id}/reorder",
    params(("id" = String, Path, description = "File ID")),
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Questions reordered"),
        (status = 403, description = "Admin access required")
    ),
    security(("jwt" = [])),
    tag = "questions"
)]
pub async fn reorder_questions(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(_file_id): Path<String>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&claims)?;

    state.bank.reorder_questions(&req.question_ids).await?;

    Ok(Json(serde_json::json!({ "success": true })))
}
