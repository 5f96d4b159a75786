use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

use super::BankService;

pub struct NewQuestion {
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
    pub question_type: i32,
    pub section: String,
    pub order_index: i32,
}

/// Partial update; `None` fields are left untouched.
#[derive(Default)]
pub struct QuestionUpdate {
    pub question_text: Option<String>,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub option3: Option<String>,
    pub option4: Option<String>,
    pub option5: Option<String>,
    pub answer: Option<String>,
    pub explanation: Option<String>,
    pub question_image_id: Option<Option<String>>,
    pub explanation_image_id: Option<Option<String>>,
    pub question_type: Option<i32>,
    pub section: Option<String>,
}

impl BankService {
    pub async fn create_question(
        &self,
        question: NewQuestion,
    ) -> Result<questions::Model, AppError> {
        if question.question_text.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Question text is required".to_string(),
            ));
        }

        Files::find_by_id(&question.file_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let created = questions::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            file_id: Set(question.file_id.clone()),
            question_text: Set(question.question_text),
            option1: Set(question.option1),
            option2: Set(question.option2),
            option3: Set(question.option3),
            option4: Set(question.option4),
            option5: Set(question.option5),
            answer: Set(question.answer),
            explanation: Set(question.explanation),
            question_image_id: Set(question.question_image_id),
            explanation_image_id: Set(question.explanation_image_id),
            question_type: Set(question.question_type),
            section: Set(question.section),
            order_index: Set(question.order_index),
            created_at: Set(Some(Utc::now())),
        }
        .insert(&self.db)
        .await?;

        self.adjust_total_questions(&question.file_id, 1).await?;

        Ok(created)
    }

    pub async fn update_question(
        &self,
        question_id: &str,
        update: QuestionUpdate,
    ) -> Result<questions::Model, AppError> {
        let existing = Questions::find_by_id(question_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

        let mut model: questions::ActiveModel = existing.into();

        if let Some(v) = update.question_text {
            model.question_text = Set(v);
        }
        if let Some(v) = update.option1 {
            model.option1 = Set(v);
        }
        if let Some(v) = update.option2 {
            model.option2 = Set(v);
        }
        if let Some(v) = update.option3 {
            model.option3 = Set(v);
        }
        if let Some(v) = update.option4 {
            model.option4 = Set(v);
        }
        if let Some(v) = update.option5 {
            model.option5 = Set(v);
        }
        if let Some(v) = update.answer {
            model.answer = Set(v);
        }
        if let Some(v) = update.explanation {
            model.explanation = Set(v);
        }
        if let Some(v) = update.question_image_id {
            model.question_image_id = Set(v);
        }
        if let Some(v) = update.explanation_image_id {
            model.explanation_image_id = Set(v);
        }
        if let Some(v) = update.question_type {
            model.question_type = Set(v);
        }
        if let Some(v) = update.section {
            model.section = Set(v);
        }

        Ok(model.update(&self.db).await?)
    }

    /// Deletes one question: its images best-effort, the row, then the
    /// parent counter (floor-clamped at zero).
    pub async fn delete_question(&self, question_id: &str) -> Result<(), AppError> {
        let question = Questions::find_by_id(question_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

        let file_id = question.file_id.clone();

        self.delete_question_images(&question).await;

        Questions::delete_by_id(question_id).exec(&self.db).await?;

        self.adjust_total_questions(&file_id, -1).await?;

        Ok(())
    }

    /// Rewrites `order_index` to the position of each id in the given list.
    pub async fn reorder_questions(&self, question_ids: &[String]) -> Result<(), AppError> {
        for (i, id) in question_ids.iter().enumerate() {
            questions::ActiveModel {
                id: Set(id.clone()),
                order_index: Set(i as i32),
                ..Default::default()
            }
            .update(&self.db)
            .await?;
        }

        Ok(())
    }
}
