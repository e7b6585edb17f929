/// Database configuration and connection management
pub mod database;

/// Academy policy settings loaded from academy.toml
pub mod settings;

/// Bootstrap administrator account from environment variables
pub mod users;
