use crate::config::AppConfig;
use crate::services::storage::StorageService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod delete;
pub mod ingest;
pub mod questions;

pub use ingest::CsvUploadOutcome;
pub use questions::{NewQuestion, QuestionUpdate};

/// Orchestrates question-bank mutations: CSV ingestion and merge, single
/// question edits, and cascade deletion, keeping each file's
/// `total_questions` counter in step.
///
/// Counter updates are read-modify-write round trips; concurrent writers
/// against the same file can lose an update. The design assumes
/// operator-driven, effectively serialized usage.
pub struct BankService {
    db: DatabaseConnection,
    storage: Arc<dyn StorageService>,
    config: AppConfig,
}

impl BankService {
    pub fn new(db: DatabaseConnection, storage: Arc<dyn StorageService>, config: AppConfig) -> Self {
        Self {
            db,
            storage,
            config,
        }
    }
}
