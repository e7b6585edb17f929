//! Product entity - Catalog items the academy sells or rents out.
//!
//! `stock_quantity` never goes below zero; rentals and sales decrement it inside the
//! same database transaction that records them. Products are soft deleted.

use super::sea_orm_active_enums::ProductType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Catalog category
    pub product_type: ProductType,
    /// Name of the product (e.g. "Yamaha P-45 Digital Piano")
    pub name: String,
    /// Model designation
    pub model: Option<String>,
    /// Serial number for individually tracked instruments
    pub serial_number: Option<String>,
    /// Supplier the product is bought from
    pub supplier_id: Option<i64>,
    /// Purchase cost per unit in dollars
    pub cost: f64,
    /// Selling price per unit in dollars
    pub selling_price: f64,
    /// Rental fee per period in dollars; `None` if the product is not rentable
    pub rental_price: Option<f64>,
    /// Units on hand
    pub stock_quantity: i32,
    /// Stock at or below which the product needs reordering
    pub reorder_level: i32,
    /// Inactive products cannot be rented or sold
    pub active: bool,
    /// Soft delete flag - if true, product is hidden but data is preserved
    pub is_deleted: bool,
    /// When the product was created
    pub created_at: DateTime,
    /// When the product was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product may belong to one supplier
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    /// One product has many rentals
    #[sea_orm(has_many = "super::rental::Entity")]
    Rentals,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::rental::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rentals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
