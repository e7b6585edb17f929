//! Enrollment entity - Binds one student to one teacher for one instrument.
//!
//! An enrollment is active while `end_date` is `None`. Credits are bought and
//! consumed per enrollment.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Enrollment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    /// Unique identifier for the enrollment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Enrolled student
    pub student_id: i64,
    /// Assigned teacher
    pub teacher_id: i64,
    /// Instrument being studied
    pub instrument_id: i64,
    /// First day of the enrollment
    pub start_date: Date,
    /// Last day of the enrollment; `None` while active
    pub end_date: Option<Date>,
}

impl Model {
    /// Whether the enrollment is still running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.end_date.is_none()
    }
}

/// Defines relationships between Enrollment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each enrollment belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
    /// Each enrollment has exactly one balance row
    #[sea_orm(has_one = "super::student_balance::Entity")]
    Balance,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::student_balance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Balance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
