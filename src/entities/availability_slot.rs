//! Availability slot entity - A weekly window in which a teacher or student
//! has declared they can attend lessons.
//!
//! The owner is polymorphic (`owner_kind` + `owner_id`) so no foreign key is declared.

use super::sea_orm_active_enums::{ActorKind, Weekday};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Availability slot database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "availability_slots")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Whether the owner is a teacher or a student
    pub owner_kind: ActorKind,
    /// Teacher or student id
    pub owner_id: i64,
    /// Day of the week
    pub day: Weekday,
    /// Window start (inclusive)
    pub start_time: Time,
    /// Window end (exclusive)
    pub end_time: Time,
}

/// `AvailabilitySlot` has no declared relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
