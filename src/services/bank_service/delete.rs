use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect};
use tracing::{info, warn};

use super::BankService;

/// Batch size for the cascade delete scan.
const DELETE_BATCH_SIZE: u64 = 100;

impl BankService {
    /// Deletes a file and everything it owns: child questions (each with its
    /// images), the stored source CSV, then the file row itself.
    ///
    /// The cascade is multi-step and not atomic; image and source-object
    /// deletion are best-effort, row deletions are not.
    pub async fn delete_file(&self, file_id: &str) -> Result<(), AppError> {
        let file = Files::find_by_id(file_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        loop {
            let batch = Questions::find()
                .filter(questions::Column::FileId.eq(file_id))
                .limit(DELETE_BATCH_SIZE)
                .all(&self.db)
                .await?;

            let has_more = batch.len() as u64 == DELETE_BATCH_SIZE;

            for question in &batch {
                self.delete_question_images(question).await;
                Questions::delete_by_id(&question.id).exec(&self.db).await?;
            }

            if !has_more {
                break;
            }
        }

        if let Some(ref storage_file_id) = file.storage_file_id {
            if let Err(e) = self
                .storage
                .delete_file(&self.config.source_files_bucket, storage_file_id)
                .await
            {
                warn!("Failed to delete source file {}: {:#}", storage_file_id, e);
            }
        }

        Files::delete_by_id(file_id).exec(&self.db).await?;

        info!("Deleted file {} ({})", file_id, file.original_filename);

        Ok(())
    }

    /// Best-effort deletion of a question's images; failures are logged and
    /// never propagated.
    pub(super) async fn delete_question_images(&self, question: &questions::Model) {
        for image_id in [&question.question_image_id, &question.explanation_image_id]
            .into_iter()
            .flatten()
        {
            if let Err(e) = self
                .storage
                .delete_file(&self.config.question_images_bucket, image_id)
                .await
            {
                warn!("Failed to delete question image {}: {:#}", image_id, e);
            }
        }
    }
}
