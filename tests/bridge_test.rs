use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use qbank_backend::config::AppConfig;
use qbank_backend::entities::{prelude::*, *};
use qbank_backend::infrastructure::database;
use qbank_backend::services::bank_service::BankService;
use qbank_backend::services::storage::StorageService;
use qbank_backend::{AppState, create_app};
use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, Set,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

/// Bridge reads never touch object bytes; only view URLs are computed.
struct UrlOnlyStorage;

#[async_trait]
impl StorageService for UrlOnlyStorage {
    async fn upload_file(
        &self,
        _bucket: &str,
        _key: &str,
        _data: Vec<u8>,
        _content_type: &str,
    ) -> Result<()> {
        Ok(())
    }

    async fn delete_file(&self, _bucket: &str, _key: &str) -> Result<()> {
        Ok(())
    }

    async fn file_exists(&self, _bucket: &str, _key: &str) -> Result<bool> {
        Ok(false)
    }

    fn get_view_url(&self, bucket: &str, key: &str) -> String {
        format!("http://storage.test/{}/{}", bucket, key)
    }
}

async fn setup() -> (Router, DatabaseConnection) {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1);
    let db = Database::connect(opt).await.unwrap();
    database::run_migrations(&db).await.unwrap();

    let storage: Arc<dyn StorageService> = Arc::new(UrlOnlyStorage);
    let config = AppConfig::default(); // api_secret_token: "secret"
    let bank = Arc::new(BankService::new(
        db.clone(),
        storage.clone(),
        config.clone(),
    ));

    let state = AppState {
        db: db.clone(),
        storage,
        bank,
        config,
    };

    (create_app(state), db)
}

async fn seed_file(
    db: &DatabaseConnection,
    id: &str,
    display_name: Option<&str>,
    uploaded_offset_minutes: i64,
) {
    files::ActiveModel {
        id: Set(id.to_string()),
        original_filename: Set(format!("{id}.csv")),
        display_name: Set(display_name.map(String::from)),
        storage_file_id: Set(None),
        total_questions: Set(0),
        uploaded_by: Set("admin".to_string()),
        uploaded_at: Set(Utc::now() - Duration::minutes(uploaded_offset_minutes)),
        created_at: Set(Some(Utc::now())),
    }
    .insert(db)
    .await
    .unwrap();
}

async fn seed_question(
    db: &DatabaseConnection,
    id: &str,
    file_id: &str,
    order_index: i32,
    question_image_id: Option<&str>,
) {
    questions::ActiveModel {
        id: Set(id.to_string()),
        file_id: Set(file_id.to_string()),
        question_text: Set(format!("<p>Question {id}</p>")),
        option1: Set("A".to_string()),
        option2: Set("B".to_string()),
        option3: Set(String::new()),
        option4: Set(String::new()),
        option5: Set(String::new()),
        answer: Set("2".to_string()),
        explanation: Set("Because".to_string()),
        question_image_id: Set(question_image_id.map(String::from)),
        explanation_image_id: Set(None),
        question_type: Set(1),
        section: Set("p".to_string()),
        order_index: Set(order_index),
        created_at: Set(Some(Utc::now())),
    }
    .insert(db)
    .await
    .unwrap();
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_token_gate_rejects_every_route() {
    let (app, db) = setup().await;
    seed_file(&db, "f1", None, 0).await;
    seed_question(&db, "q1", "f1", 0, None).await;

    let routes = [
        "/api/questions?route=files",
        "/api/questions?token=wrong&route=files",
        "/api/questions?route=questions",
        "/api/questions?token=wrong&route=question&id=q1",
    ];
    for uri in routes {
        let (status, json) = get(&app, uri).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "uri: {uri}");
        assert_eq!(json["error"], "Invalid or missing API Token");
    }

    let (status, _) = post(
        &app,
        "/api/questions?token=wrong&route=update-question",
        json!({"id": "q1", "question_text": "hacked"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let untouched = Questions::find_by_id("q1").one(&db).await.unwrap().unwrap();
    assert_eq!(untouched.question_text, "<p>Question q1</p>");
}

#[tokio::test]
async fn test_files_route_orders_recent_first_with_display_name_fallback() {
    let (app, db) = setup().await;
    seed_file(&db, "older", Some("Named"), 60).await;
    seed_file(&db, "newer", None, 0).await;

    let (status, json) = get(&app, "/api/questions?token=secret&route=files").await;
    assert_eq!(status, StatusCode::OK);

    let files = json.as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["id"], "newer");
    assert_eq!(files[1]["id"], "older");
    // display_name falls back to original_filename when absent
    assert_eq!(files[0]["display_name"], "newer.csv");
    assert_eq!(files[1]["display_name"], "Named");
    assert_eq!(files[0]["original_filename"], "newer.csv");
    assert_eq!(files[0]["total_questions"], 0);
    assert!(files[0]["uploaded_at"].is_string());
}

#[tokio::test]
async fn test_questions_route_translates_fields() {
    let (app, db) = setup().await;
    seed_file(&db, "f1", None, 0).await;
    seed_question(&db, "q1", "f1", 3, Some("img-1")).await;
    seed_question(&db, "q2", "f1", 0, None).await;

    let (status, json) = get(&app, "/api/questions?token=secret&route=questions&file_id=f1").await;
    assert_eq!(status, StatusCode::OK);

    let questions = json.as_array().unwrap();
    assert_eq!(questions.len(), 2);
    // order_index ascending
    assert_eq!(questions[0]["id"], "q2");
    assert_eq!(questions[1]["id"], "q1");

    let q1 = &questions[1];
    assert_eq!(q1["file_id"], "f1");
    assert_eq!(q1["question_text"], "<p>Question q1</p>");
    assert_eq!(q1["order_index"], 3);
    assert_eq!(q1["type"], 1);
    assert_eq!(q1["section"], "p");
    assert_eq!(q1["answer"], "2");
    assert_eq!(q1["question_image"], "img-1");
    assert_eq!(
        q1["question_image_url"],
        "http://storage.test/question-images/img-1"
    );
    // absent image: id null, url empty string (never null)
    assert!(q1["explanation_image"].is_null());
    assert_eq!(q1["explanation_image_url"], "");
    assert!(q1["created_at"].is_string());

    let q2 = &questions[0];
    assert!(q2["question_image"].is_null());
    assert_eq!(q2["question_image_url"], "");
}

#[tokio::test]
async fn test_questions_route_filters_by_file() {
    let (app, db) = setup().await;
    seed_file(&db, "f1", None, 0).await;
    seed_file(&db, "f2", None, 0).await;
    seed_question(&db, "q1", "f1", 0, None).await;
    seed_question(&db, "q2", "f2", 0, None).await;

    let (_, json) = get(&app, "/api/questions?token=secret&route=questions&file_id=f2").await;
    let questions = json.as_array().unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["id"], "q2");

    let (_, json) = get(&app, "/api/questions?token=secret&route=questions").await;
    assert_eq!(json.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_single_question_route_and_error_paths() {
    let (app, db) = setup().await;
    seed_file(&db, "f1", None, 0).await;
    seed_question(&db, "q1", "f1", 0, None).await;

    let (status, json) = get(&app, "/api/questions?token=secret&route=question&id=q1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "q1");
    assert_eq!(json["file_id"], "f1");

    let (status, json) = get(&app, "/api/questions?token=secret&route=question").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing question ID");

    let (status, json) = get(&app, "/api/questions?token=secret&route=question&id=nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Question not found");

    let (status, json) = get(&app, "/api/questions?token=secret&route=bogus").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Route not found or not specified");

    let (status, json) = get(&app, "/api/questions?token=secret").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Route not found or not specified");
}

#[tokio::test]
async fn test_update_question_applies_partial_snake_case_payload() {
    let (app, db) = setup().await;
    seed_file(&db, "f1", None, 0).await;
    seed_question(&db, "q1", "f1", 0, None).await;

    let (status, json) = post(
        &app,
        "/api/questions?token=secret&route=update-question",
        json!({"id": "q1", "question_text": "new text", "unknown_field": "ignored"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Question updated");

    let updated = Questions::find_by_id("q1").one(&db).await.unwrap().unwrap();
    assert_eq!(updated.question_text, "new text");
    // everything else untouched
    assert_eq!(updated.option1, "A");
    assert_eq!(updated.answer, "2");
    assert_eq!(updated.section, "p");
    assert_eq!(updated.order_index, 0);
}

#[tokio::test]
async fn test_update_question_coerces_type_and_section() {
    let (app, db) = setup().await;
    seed_file(&db, "f1", None, 0).await;
    seed_question(&db, "q1", "f1", 0, None).await;

    // type arrives as a string, section as a number
    let (status, _) = post(
        &app,
        "/api/questions?token=secret&route=update-question",
        json!({"id": "q1", "type": "7", "section": 2}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let updated = Questions::find_by_id("q1").one(&db).await.unwrap().unwrap();
    assert_eq!(updated.question_type, 7);
    assert_eq!(updated.section, "2");
}

#[tokio::test]
async fn test_update_question_error_paths() {
    let (app, db) = setup().await;
    seed_file(&db, "f1", None, 0).await;
    seed_question(&db, "q1", "f1", 0, None).await;

    let (status, json) = post(
        &app,
        "/api/questions?token=secret&route=update-question",
        json!({"question_text": "no id"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing question ID");

    let (status, json) = post(
        &app,
        "/api/questions?token=secret&route=update-question",
        json!({"id": "nope", "question_text": "x"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Question not found");

    let (status, json) = post(
        &app,
        "/api/questions?token=secret&route=files",
        json!({"id": "q1"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid route for POST");
}
