use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A question collection, created from one CSV upload (plus later merges).
///
/// `total_questions` caches the child question count and is maintained by
/// every mutation that adds or removes questions.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub original_filename: String,
    pub display_name: Option<String>,
    /// Key of the raw uploaded CSV in the source-files bucket, when the
    /// best-effort backup upload succeeded.
    pub storage_file_id: Option<String>,
    pub total_questions: i32,
    pub uploaded_by: String,
    pub uploaded_at: DateTimeUtc,
    pub created_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::questions::Entity")]
    Questions,
}

impl Related<super::questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
