//! App user entity - Staff accounts that can sign in to the administration tool.
//! Independent of the academy domain.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// App user database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "app_users")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Login email, stored lower-cased
    #[sea_orm(unique)]
    pub email: String,
    /// Whether the user can manage other users
    pub is_admin: bool,
    /// Disabled users cannot sign in
    pub is_active: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// Most recent sign-in
    pub last_login_at: Option<DateTimeUtc>,
}

/// `AppUser` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
