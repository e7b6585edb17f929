//! Student entity - Learners enrolled at the academy.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Unique identifier for the student
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name
    pub name: String,
    /// Mailing address
    pub address: String,
    /// Contact email
    pub email: String,
    /// Primary phone number (often a parent)
    pub primary_contact: String,
    /// Date of birth, if provided
    pub date_of_birth: Option<Date>,
    /// Inactive students cannot join new classes or enrollments
    pub active: bool,
}

/// Defines relationships between Student and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One student has a skill level per instrument
    #[sea_orm(has_many = "super::student_skill::Entity")]
    Skills,
    /// One student has many enrollments
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollments,
}

impl Related<super::student_skill::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Skills.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
