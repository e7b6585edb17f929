//! Transaction entity - One immutable entry in the credit and payment ledger.
//!
//! `credits` is the signed change to the enrollment balance. Attendance-driven
//! entries carry `class_id` and `occurrence_date`; corrective adjustments point at
//! the entry they cancel through `reverses_transaction_id`. Monetary fields are
//! rounded to cents when the entry is created and never recomputed.

use super::sea_orm_active_enums::{PaymentMethod, TaxType, TransactionType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Kind of ledger entry
    pub transaction_type: TransactionType,
    /// Student (or paying customer) the entry belongs to
    pub student_id: i64,
    /// Enrollment whose balance changes; `None` for inventory payments
    pub enrollment_id: Option<i64>,
    /// Class whose occurrence caused the entry, for attendance-driven entries
    pub class_id: Option<i64>,
    /// Date of that occurrence
    pub occurrence_date: Option<Date>,
    /// Entry this one cancels, for corrective adjustments
    pub reverses_transaction_id: Option<i64>,
    /// Business date of the entry
    pub date: Date,
    /// Signed credit delta applied to the enrollment balance
    pub credits: i32,
    /// Price charged per credit in dollars
    pub price_per_credit: f64,
    /// Amount before discount and tax
    pub subtotal: f64,
    /// Discount taken off the subtotal
    pub discount_amount: f64,
    /// Reason for the discount
    pub discount_note: Option<String>,
    /// Tax regime applied
    pub tax_type: TaxType,
    /// Tax rate as a fraction (0.13 for 13%)
    pub tax_rate: f64,
    /// Tax charged
    pub tax_amount: f64,
    /// Amount paid
    pub total_amount: f64,
    /// How the payment was made; `None` for non-monetary entries
    pub payment_method: Option<PaymentMethod>,
    /// Free-form note
    pub note: Option<String>,
    /// When the entry was written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
    /// Inventory payments itemize what was bought
    #[sea_orm(has_many = "super::transaction_line_item::Entity")]
    LineItems,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::transaction_line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
