use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::csv_import::{ParsedQuestionRow, parse_csv};
use crate::utils::validation::validate_csv_filename;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use tracing::{info, warn};
use uuid::Uuid;

use super::BankService;

pub struct CsvUploadOutcome {
    pub file_id: String,
    pub question_count: usize,
}

impl BankService {
    /// Creates a new question file from an uploaded CSV.
    ///
    /// Order of operations: validate extension, parse, best-effort raw-byte
    /// backup, create the file row, then one create per question. The
    /// per-question creates are sequential and not transactional; a failure
    /// partway leaves the file partially populated.
    pub async fn upload_csv(
        &self,
        original_filename: &str,
        display_name: &str,
        convert_zero_indexed: bool,
        data: Vec<u8>,
        uploaded_by: &str,
    ) -> Result<CsvUploadOutcome, AppError> {
        validate_csv_filename(original_filename)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let csv_text = String::from_utf8_lossy(&data).into_owned();
        let rows = parse_csv(&csv_text, convert_zero_indexed)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        if rows.is_empty() {
            return Err(AppError::BadRequest(
                "No valid questions found in CSV".to_string(),
            ));
        }

        // Best-effort backup of the raw upload; a storage failure downgrades
        // the outcome (no storage_file_id) instead of failing ingestion.
        let storage_file_id = {
            let key = Uuid::new_v4().to_string();
            match self
                .storage
                .upload_file(&self.config.source_files_bucket, &key, data, "text/csv")
                .await
            {
                Ok(()) => Some(key),
                Err(e) => {
                    warn!("Failed to store source CSV '{}': {:#}", original_filename, e);
                    None
                }
            }
        };

        let file_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let display_name = if display_name.trim().is_empty() {
            original_filename.to_string()
        } else {
            display_name.to_string()
        };

        files::ActiveModel {
            id: Set(file_id.clone()),
            original_filename: Set(original_filename.to_string()),
            display_name: Set(Some(display_name)),
            storage_file_id: Set(storage_file_id),
            total_questions: Set(rows.len() as i32),
            uploaded_by: Set(uploaded_by.to_string()),
            uploaded_at: Set(now),
            created_at: Set(Some(now)),
        }
        .insert(&self.db)
        .await?;

        for (i, row) in rows.iter().enumerate() {
            self.insert_question_row(&file_id, row, i as i32).await?;
        }

        info!(
            "Ingested {} questions from '{}' into file {}",
            rows.len(),
            original_filename,
            file_id
        );

        Ok(CsvUploadOutcome {
            file_id,
            question_count: rows.len(),
        })
    }

    /// Appends questions from a CSV to an existing file.
    ///
    /// New rows continue strictly after the current maximum `order_index`;
    /// existing rows are never renumbered.
    pub async fn merge_csv(
        &self,
        file_id: &str,
        original_filename: &str,
        convert_zero_indexed: bool,
        data: Vec<u8>,
    ) -> Result<usize, AppError> {
        validate_csv_filename(original_filename)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        Files::find_by_id(file_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let max_order_index = Questions::find()
            .filter(questions::Column::FileId.eq(file_id))
            .order_by_desc(questions::Column::OrderIndex)
            .limit(1)
            .one(&self.db)
            .await?
            .map(|q| q.order_index)
            .unwrap_or(-1);

        let csv_text = String::from_utf8_lossy(&data);
        let rows = parse_csv(&csv_text, convert_zero_indexed)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        if rows.is_empty() {
            return Err(AppError::BadRequest(
                "No valid questions found in CSV".to_string(),
            ));
        }

        for (i, row) in rows.iter().enumerate() {
            self.insert_question_row(file_id, row, max_order_index + 1 + i as i32)
                .await?;
        }

        self.adjust_total_questions(file_id, rows.len() as i32)
            .await?;

        info!(
            "Merged {} questions from '{}' into file {}",
            rows.len(),
            original_filename,
            file_id
        );

        Ok(rows.len())
    }

    pub(super) async fn insert_question_row(
        &self,
        file_id: &str,
        row: &ParsedQuestionRow,
        order_index: i32,
    ) -> Result<(), AppError> {
        questions::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            file_id: Set(file_id.to_string()),
            question_text: Set(row.question_text.clone()),
            option1: Set(row.option1.clone()),
            option2: Set(row.option2.clone()),
            option3: Set(row.option3.clone()),
            option4: Set(row.option4.clone()),
            option5: Set(row.option5.clone()),
            answer: Set(row.answer.clone()),
            explanation: Set(row.explanation.clone()),
            question_image_id: Set(None),
            explanation_image_id: Set(None),
            question_type: Set(row.question_type),
            section: Set(row.section.clone()),
            order_index: Set(order_index),
            created_at: Set(Some(Utc::now())),
        }
        .insert(&self.db)
        .await?;

        Ok(())
    }

    /// Read-modify-write counter update, floor-clamped at zero. Concurrent
    /// callers against the same file can lose an update (last write wins).
    pub(super) async fn adjust_total_questions(
        &self,
        file_id: &str,
        delta: i32,
    ) -> Result<(), AppError> {
        let file = Files::find_by_id(file_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        files::ActiveModel {
            id: Set(file.id),
            total_questions: Set((file.total_questions + delta).max(0)),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }
}
