use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One multiple-choice question.
///
/// `answer` is free text by convention an option index (1-5) or letter (A-E);
/// it is never validated against which options are populated. `order_index`
/// is zero-based within the owning file and defines display order.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub file_id: String,
    #[sea_orm(column_type = "Text")]
    pub question_text: String,
    #[sea_orm(column_type = "Text")]
    pub option1: String,
    #[sea_orm(column_type = "Text")]
    pub option2: String,
    #[sea_orm(column_type = "Text")]
    pub option3: String,
    #[sea_orm(column_type = "Text")]
    pub option4: String,
    #[sea_orm(column_type = "Text")]
    pub option5: String,
    pub answer: String,
    #[sea_orm(column_type = "Text")]
    pub explanation: String,
    pub question_image_id: Option<String>,
    pub explanation_image_id: Option<String>,
    #[sea_orm(column_name = "type")]
    pub question_type: i32,
    pub section: String,
    pub order_index: i32,
    pub created_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::files::Entity",
        from = "Column::FileId",
        to = "super::files::Column::Id"
    )]
    Files,
}

impl Related<super::files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
