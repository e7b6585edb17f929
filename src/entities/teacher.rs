//! Teacher entity - Instructors with contact details, qualification and hourly rate.
//!
//! Teachers are deactivated rather than deleted so that classes, enrollments and
//! ledger history keep resolving.

use super::sea_orm_active_enums::Qualification;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Teacher database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teachers")]
pub struct Model {
    /// Unique identifier for the teacher
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name
    pub name: String,
    /// Mailing address
    pub address: String,
    /// Contact email
    pub email: String,
    /// Primary phone number
    pub primary_contact: String,
    /// Date of birth, if provided
    pub date_of_birth: Option<Date>,
    /// Free-form biography
    pub biography: Option<String>,
    /// Musical specialization (e.g. "Jazz piano")
    pub specialization: String,
    /// Highest qualification
    pub qualification: Qualification,
    /// Date the teacher joined the academy
    pub date_of_enrollment: Date,
    /// Rate billed per teaching hour in dollars
    pub hourly_rate: f64,
    /// Inactive teachers cannot receive new classes or enrollments
    pub active: bool,
}

/// Defines relationships between Teacher and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One teacher teaches many instruments
    #[sea_orm(has_many = "super::teacher_instrument::Entity")]
    TeacherInstruments,
    /// One teacher runs many classes
    #[sea_orm(has_many = "super::class::Entity")]
    Classes,
}

impl Related<super::teacher_instrument::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeacherInstruments.def()
    }
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
