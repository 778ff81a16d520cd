//! SQLite persistence for the OMERO question types: schema guards,
//! repositories for the options tables and the bookkeeping tables, plus the
//! install and upgrade runners.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub mod error;
pub mod install;
pub mod models;
pub mod repositories;
pub mod upgrade;

pub type DbPool = sqlx::SqlitePool;

/// Create a connection pool from a database URL, creating the file if needed.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Create the bookkeeping tables (`plugin_versions`, `upgrade_log`).
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
