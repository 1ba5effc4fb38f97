//! Database configuration module for the local store.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::entities::{
    Budget, Expense, ExpenseCategory, Income, Saving, SavingGoal, SyncState, User,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

/// Default location of the on-device database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/finance_sync.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back
/// to `configured` and then to [`DEFAULT_DATABASE_URL`].
#[must_use]
pub fn get_database_url(configured: Option<&str>) -> String {
    std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| configured.map(ToString::to_string))
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the `SQLite` database and ensures all tables exist.
///
/// The returned connection is the single store handle for the process; clone it
/// (it is a pool handle) rather than opening another one.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to local store at {}", database_url);
    ensure_database_dir(database_url)?;
    let db = Database::connect(database_url).await?;
    create_tables(&db).await?;
    info!("Local store ready");
    Ok(db)
}

/// File path of a `sqlite://` URL, `None` for in-memory databases.
fn sqlite_file_path(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    (!path.is_empty() && path != ":memory:").then(|| Path::new(path))
}

/// Creates the directory holding the database file, if needed.
fn ensure_database_dir(database_url: &str) -> Result<()> {
    if let Some(parent) = sqlite_file_path(database_url)
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

async fn create_table<E, C>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates every local store table if it does not exist yet.
///
/// No foreign keys are declared: referential integrity between owned records is a
/// convention kept by the sync jobs and the creating UI.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Budget).await?;
    create_table(db, &schema, SavingGoal).await?;
    create_table(db, &schema, Saving).await?;
    create_table(db, &schema, Income).await?;
    create_table(db, &schema, ExpenseCategory).await?;
    create_table(db, &schema, Expense).await?;
    create_table(db, &schema, SyncState).await?;

    Ok(())
}
