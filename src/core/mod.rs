//! Core business logic - framework-agnostic roster, scheduling, ledger, inventory
//! and reporting operations. Every function takes a `SeaORM` connection and returns
//! a crate [`Result`](crate::errors::Result).

pub mod attendance;
pub mod availability;
pub mod dashboard;
pub mod enrollment;
pub mod inventory;
pub mod ledger;
pub mod money;
pub mod query;
pub mod rental;
pub mod roster;
pub mod schedule;
pub mod users;

use crate::errors::{Error, Result};

/// Trims a required text field, rejecting blank values.
pub(crate) fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field, mapping blank values to `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
