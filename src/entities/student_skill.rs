//! Student skill entity - A student's proficiency on one instrument.

use super::sea_orm_active_enums::SkillLevel;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student skill database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student_skills")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Student id
    pub student_id: i64,
    /// Instrument id
    pub instrument_id: i64,
    /// Current level on that instrument
    pub level: SkillLevel,
}

/// Defines relationships between `StudentSkill` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each skill belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
