//! Student balance entity - Running credit totals for one enrollment.
//!
//! Maintained by the ledger in the same database transaction as every entry it
//! writes, so `current_balance == total_purchased - total_used` and equals the sum of
//! the enrollment's transaction credits.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student balance database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student_balances")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Enrollment the balance belongs to (one row per enrollment)
    #[sea_orm(unique)]
    pub enrollment_id: i64,
    /// Student, denormalized for per-student listing
    pub student_id: i64,
    /// Credits bought or granted
    pub total_purchased: i32,
    /// Credits consumed or removed
    pub total_used: i32,
    /// Credits available
    pub current_balance: i32,
}

/// Defines relationships between `StudentBalance` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each balance belongs to one enrollment
    #[sea_orm(
        belongs_to = "super::enrollment::Entity",
        from = "Column::EnrollmentId",
        to = "super::enrollment::Column::Id"
    )]
    Enrollment,
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
