//! Bootstrap administrator configuration from environment variables.
//!
//! On a fresh install there is nobody who can create accounts, so the binary
//! creates one administrator from `ADMIN_NAME` and `ADMIN_EMAIL` if both are set.

/// Name and email of the administrator created at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
}

/// Builds the bootstrap admin from raw values, ignoring blank ones.
#[must_use]
pub fn bootstrap_admin_from(name: Option<String>, email: Option<String>) -> Option<BootstrapAdmin> {
    let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())?;
    let email = email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty())?;
    Some(BootstrapAdmin { name, email })
}

/// Reads `ADMIN_NAME` and `ADMIN_EMAIL` from the environment.
///
/// # Returns
///
/// `Some(admin)` only when both variables are set and non-blank.
#[must_use]
pub fn get_bootstrap_admin() -> Option<BootstrapAdmin> {
    bootstrap_admin_from(
        std::env::var("ADMIN_NAME").ok(),
        std::env::var("ADMIN_EMAIL").ok(),
    )
}
