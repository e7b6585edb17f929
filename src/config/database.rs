//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust models
//! without hand-written SQL. Creation is `IF NOT EXISTS`, which makes startup
//! idempotent against an existing database file.

use crate::entities::{
    AppUser, AttendanceRecord, AvailabilitySlot, Class, ClassStudent, Customer, Enrollment,
    Instrument, Product, Rental, Sale, Student, StudentBalance, StudentSkill, Supplier, Teacher,
    TeacherInstrument, Transaction, TransactionLineItem,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/encore.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a default local `SQLite` file if not found.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the `SQLite` database using the `DATABASE_URL` environment variable.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    tracing::debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all necessary database tables using `SeaORM`'s schema generation from entity definitions.
///
/// Parent tables are created before the tables that reference them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Instrument).await?;
    create_table(db, &schema, Teacher).await?;
    create_table(db, &schema, TeacherInstrument).await?;
    create_table(db, &schema, Student).await?;
    create_table(db, &schema, StudentSkill).await?;
    create_table(db, &schema, AvailabilitySlot).await?;
    create_table(db, &schema, Enrollment).await?;
    create_table(db, &schema, StudentBalance).await?;
    create_table(db, &schema, Class).await?;
    create_table(db, &schema, ClassStudent).await?;
    create_table(db, &schema, AttendanceRecord).await?;
    create_table(db, &schema, Transaction).await?;
    create_table(db, &schema, TransactionLineItem).await?;
    create_table(db, &schema, Supplier).await?;
    create_table(db, &schema, Customer).await?;
    create_table(db, &schema, Product).await?;
    create_table(db, &schema, Rental).await?;
    create_table(db, &schema, Sale).await?;
    create_table(db, &schema, AppUser).await?;

    tracing::debug!("Database schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ClassModel, ProductModel, StudentBalanceModel, TransactionModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<ClassModel> = Class::find().limit(1).all(&db).await?;
        let _: Vec<ProductModel> = Product::find().limit(1).all(&db).await?;
        let _: Vec<TransactionModel> = Transaction::find().limit(1).all(&db).await?;
        let _: Vec<StudentBalanceModel> = StudentBalance::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
