//! Class entity - A recurring weekly lesson run by one teacher for one instrument.
//!
//! Students are linked through `class_students`. Whether a class is private or
//! a group class is derived from the number of linked students and is never stored.
//! Cancelled classes are kept so attendance history still resolves.

use super::sea_orm_active_enums::{ClassDuration, ClassStatus, Frequency, Weekday};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Class database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    /// Unique identifier for the class
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Teacher running the class
    pub teacher_id: i64,
    /// Instrument taught
    pub instrument_id: i64,
    /// Day of the week the class meets
    pub weekday: Weekday,
    /// Start time of the lesson
    pub start_time: Time,
    /// Lesson length
    pub duration: ClassDuration,
    /// Meetings per week
    pub frequency: Frequency,
    /// Scheduled or cancelled
    pub status: ClassStatus,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Defines relationships between Class and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each class belongs to one teacher
    #[sea_orm(
        belongs_to = "super::teacher::Entity",
        from = "Column::TeacherId",
        to = "super::teacher::Column::Id"
    )]
    Teacher,
    /// One class has many enrolled students
    #[sea_orm(has_many = "super::class_student::Entity")]
    ClassStudents,
    /// One class has many attendance records
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    AttendanceRecords,
}

impl Related<super::teacher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::class_student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassStudents.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
