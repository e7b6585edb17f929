//! Instrument entity - An instrument the academy teaches (e.g. "Piano").

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Instrument database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "instruments")]
pub struct Model {
    /// Unique identifier for the instrument
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique across the catalog
    #[sea_orm(unique)]
    pub name: String,
}

/// Instruments are referenced by id only; no navigable relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
