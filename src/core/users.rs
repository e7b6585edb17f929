//! Staff accounts for the academy back office.
//!
//! Emails are stored lower-cased and are unique. Accounts are deactivated, never
//! deleted. Password handling lives outside this crate.

use crate::{
    config::users::BootstrapAdmin,
    core::require_text,
    entities::{AppUser, app_user},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};

/// Input for [`create_user`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Whether the user can manage other accounts
    pub is_admin: bool,
}

fn normalize_email(email: &str) -> Result<String> {
    let email = require_text("Email", email)?.to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(Error::validation(format!("'{email}' is not a valid email"))),
    }
}

/// Finds a user by email, ignoring case.
pub async fn get_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<app_user::Model>> {
    AppUser::find()
        .filter(app_user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates an active user.
///
/// # Errors
/// Returns [`Error::Validation`] for a blank name, a malformed email, or an email
/// that is already registered.
pub async fn create_user(db: &DatabaseConnection, input: NewUser) -> Result<app_user::Model> {
    let name = require_text("User name", &input.name)?;
    let email = normalize_email(&input.email)?;

    if get_user_by_email(db, &email).await?.is_some() {
        return Err(Error::validation(format!("A user with email {email} already exists")));
    }

    let created = app_user::ActiveModel {
        name: Set(name),
        email: Set(email),
        is_admin: Set(input.is_admin),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now()),
        last_login_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;
    tracing::info!(user_id = created.id, is_admin = created.is_admin, "Created user");
    Ok(created)
}

/// Finds a user by id.
pub async fn get_user(db: &DatabaseConnection, user_id: i64) -> Result<Option<app_user::Model>> {
    AppUser::find_by_id(user_id)
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_user(db: &DatabaseConnection, user_id: i64) -> Result<app_user::Model> {
    get_user(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))
}

/// Filter for [`list_users`]; `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Only admins (or only staff)
    pub is_admin: Option<bool>,
    /// Only active (or only inactive) accounts
    pub is_active: Option<bool>,
    /// Name or email contains this text
    pub search: Option<String>,
}

/// Users matching every set filter field, alphabetically.
pub async fn list_users(
    db: &DatabaseConnection,
    filter: &UserFilter,
) -> Result<Vec<app_user::Model>> {
    let mut query = AppUser::find();
    if let Some(is_admin) = filter.is_admin {
        query = query.filter(app_user::Column::IsAdmin.eq(is_admin));
    }
    if let Some(is_active) = filter.is_active {
        query = query.filter(app_user::Column::IsActive.eq(is_active));
    }
    if let Some(text) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(app_user::Column::Name.contains(text))
                .add(app_user::Column::Email.contains(text.to_lowercase())),
        );
    }
    query
        .order_by_asc(app_user::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Flips a user between active and inactive.
pub async fn toggle_user_status(db: &DatabaseConnection, user_id: i64) -> Result<app_user::Model> {
    let existing = require_user(db, user_id).await?;
    let now_active = !existing.is_active;

    let mut model: app_user::ActiveModel = existing.into();
    model.is_active = Set(now_active);
    let updated = model.update(db).await?;
    tracing::info!(user_id, active = now_active, "Toggled user status");
    Ok(updated)
}

/// Stamps a successful login.
///
/// # Errors
/// Returns [`Error::Validation`] if the account is inactive.
pub async fn record_login(
    db: &DatabaseConnection,
    user_id: i64,
    at: DateTimeUtc,
) -> Result<app_user::Model> {
    let existing = require_user(db, user_id).await?;
    if !existing.is_active {
        return Err(Error::validation(format!("User {user_id} is inactive")));
    }

    let mut model: app_user::ActiveModel = existing.into();
    model.last_login_at = Set(Some(at));
    model.update(db).await.map_err(Into::into)
}

/// Creates the configured administrator unless that email is already registered.
///
/// Returns the new account, or `None` if nothing was created.
pub async fn bootstrap_admin(
    db: &DatabaseConnection,
    admin: &BootstrapAdmin,
) -> Result<Option<app_user::Model>> {
    if get_user_by_email(db, &admin.email).await?.is_some() {
        tracing::debug!("Bootstrap admin already exists");
        return Ok(None);
    }
    create_user(
        db,
        NewUser {
            name: admin.name.clone(),
            email: admin.email.clone(),
            is_admin: true,
        },
    )
    .await
    .map(Some)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_create_user_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        for bad in ["", "no-at-sign", "@example.com", "ada@localhost"] {
            let result = create_user(&db, user("Ada", bad)).await;
            assert!(matches!(result.unwrap_err(), Error::Validation { .. }), "{bad}");
        }
        let result = create_user(&db, user(" ", "ada@example.com")).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_email_is_unique_ignoring_case() -> Result<()> {
        let db = setup_test_db().await?;

        let created = create_user(&db, user("Ada", " Ada@Example.com ")).await?;
        assert_eq!(created.email, "ada@example.com");
        assert!(created.is_active);

        let result = create_user(&db, user("Other Ada", "ADA@example.com")).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_and_login() -> Result<()> {
        let db = setup_test_db().await?;
        let ada = create_user(&db, user("Ada", "ada@example.com")).await?;
        let at = chrono::DateTime::from_timestamp(1_704_700_800, 0).unwrap();

        let logged_in = record_login(&db, ada.id, at).await?;
        assert_eq!(logged_in.last_login_at, Some(at));

        let disabled = toggle_user_status(&db, ada.id).await?;
        assert!(!disabled.is_active);
        let result = record_login(&db, ada.id, at).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let enabled = toggle_user_status(&db, ada.id).await?;
        assert!(enabled.is_active);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_users_filters() -> Result<()> {
        let db = setup_test_db().await?;
        create_user(&db, user("Grace", "grace@example.com")).await?;
        let ada = create_user(&db, user("Ada", "ada@example.com")).await?;
        toggle_user_status(&db, ada.id).await?;

        let active = list_users(
            &db,
            &UserFilter {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Grace");

        let found = list_users(
            &db,
            &UserFilter {
                search: Some("ADA@".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, ada.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_bootstrap_admin_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = BootstrapAdmin {
            name: "Owner".to_string(),
            email: "owner@example.com".to_string(),
        };

        let created = bootstrap_admin(&db, &admin).await?.unwrap();
        assert!(created.is_admin);
        assert!(bootstrap_admin(&db, &admin).await?.is_none());
        assert_eq!(list_users(&db, &UserFilter::default()).await?.len(), 1);
        Ok(())
    }
}
