//! Rental entity - One unit of a product lent to a customer for a period.
//!
//! Status is deliberately not a column: it is derived from `due_date` and
//! `return_date` against the current date on every read
//! (see [`crate::core::rental::rental_status`]). `late_fee` stays zero until the
//! rental is returned late.

use super::sea_orm_active_enums::RentalPeriod;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Rental database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rentals")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product rented
    pub product_id: i64,
    /// Customer renting it
    pub customer_id: i64,
    /// Billing period
    pub rental_period: RentalPeriod,
    /// First day of the rental
    pub start_date: Date,
    /// Day the product is due back
    pub due_date: Date,
    /// Day the product came back; `None` while out
    pub return_date: Option<Date>,
    /// Refundable deposit in dollars
    pub deposit: f64,
    /// Fee for the period in dollars
    pub rental_fee: f64,
    /// Late fee charged at return in dollars
    pub late_fee: f64,
    /// Condition of the product at checkout or return
    pub condition_notes: Option<String>,
}

/// Defines relationships between Rental and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each rental is of one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// Each rental is held by one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
