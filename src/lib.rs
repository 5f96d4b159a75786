pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::bank_service::BankService;
use crate::services::storage::StorageService;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::health::health_check,
        api::handlers::files::list_files,
        api::handlers::files::get_file,
        api::handlers::files::update_file,
        api::handlers::files::delete_file,
        api::handlers::files::upload_csv,
        api::handlers::files::merge_csv,
        api::handlers::questions::list_questions,
        api::handlers::questions::get_question,
        api::handlers::questions::create_question,
        api::handlers::questions::update_question,
        api::handlers::questions::delete_question,
        api::handlers::questions::reorder_questions,
        api::handlers::images::upload_image,
        api::handlers::images::delete_image,
        api::handlers::bridge::bridge_get,
        api::handlers::bridge::bridge_post,
    ),
    components(
        schemas(
            api::handlers::auth::RegisterRequest,
            api::handlers::auth::LoginRequest,
            api::handlers::auth::AuthResponse,
            api::handlers::health::HealthResponse,
            api::handlers::files::FileResponse,
            api::handlers::files::PaginatedFilesResponse,
            api::handlers::files::UpdateFileRequest,
            api::handlers::files::UploadCsvResponse,
            api::handlers::files::MergeCsvResponse,
            api::handlers::questions::QuestionResponse,
            api::handlers::questions::PaginatedQuestionsResponse,
            api::handlers::questions::CreateQuestionRequest,
            api::handlers::questions::UpdateQuestionRequest,
            api::handlers::questions::ReorderRequest,
            api::handlers::images::ImageUploadResponse,
            api::handlers::bridge::ExternalFile,
            api::handlers::bridge::ExternalQuestion,
        )
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "files", description = "Question file management"),
        (name = "questions", description = "Question management"),
        (name = "images", description = "Question image storage"),
        (name = "bridge", description = "Token-gated external API")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn StorageService>,
    pub bank: Arc<BankService>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    let auth = |state: &AppState| {
        from_fn_with_state(state.clone(), api::middleware::auth::auth_middleware)
    };

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/register", post(api::handlers::auth::register))
        .route("/login", post(api::handlers::auth::login))
        // The bridge authenticates itself with the shared-secret token.
        .route(
            "/api/questions",
            get(api::handlers::bridge::bridge_get).post(api::handlers::bridge::bridge_post),
        )
        .route(
            "/files",
            get(api::handlers::files::list_files).layer(auth(&state)),
        )
        .route(
            "/files/upload-csv",
            post(api::handlers::files::upload_csv).layer(auth(&state)),
        )
        .route(
            "/files/:id",
            get(api::handlers::files::get_file)
                .put(api::handlers::files::update_file)
                .delete(api::handlers::files::delete_file)
                .layer(auth(&state)),
        )
        .route(
            "/files/:id/merge-csv",
            post(api::handlers::files::merge_csv).layer(auth(&state)),
        )
        .route(
            "/files/:id/reorder",
            put(api::handlers::questions::reorder_questions).layer(auth(&state)),
        )
        .route(
            "/questions",
            get(api::handlers::questions::list_questions)
                .post(api::handlers::questions::create_question)
                .layer(auth(&state)),
        )
        .route(
            "/questions/:id",
            get(api::handlers::questions::get_question)
                .put(api::handlers::questions::update_question)
                .delete(api::handlers::questions::delete_question)
                .layer(auth(&state)),
        )
        .route(
            "/images",
            post(api::handlers::images::upload_image).layer(auth(&state)),
        )
        .route(
            "/images/:id",
            delete(api::handlers::images::delete_image).layer(auth(&state)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_upload_size + 1024 * 1024, // multipart overhead
        ))
        .with_state(state)
}
