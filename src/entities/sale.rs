//! Sale entity - Products sold to a customer.

use super::sea_orm_active_enums::PaymentMethod;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product sold
    pub product_id: i64,
    /// Buyer
    pub customer_id: i64,
    /// Date of sale
    pub date: Date,
    /// Units sold
    pub quantity: i32,
    /// Price per unit in dollars
    pub unit_price: f64,
    /// `quantity * unit_price`, rounded to cents
    pub total_amount: f64,
    /// How the buyer paid
    pub payment_method: PaymentMethod,
}

/// Defines relationships between Sale and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each sale is of one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
