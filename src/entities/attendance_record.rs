//! Attendance record entity - Whether a student attended one occurrence of a class.
//!
//! There is at most one record per (class, student, date); re-marking overwrites it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attendance record database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Class the occurrence belongs to
    pub class_id: i64,
    /// Student the mark is for
    pub student_id: i64,
    /// Calendar date of the occurrence
    pub date: Date,
    /// Whether the student attended
    pub attended: bool,
}

/// Defines relationships between `AttendanceRecord` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each record belongs to one class
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id"
    )]
    Class,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
