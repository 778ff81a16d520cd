//! Schema guards for the options tables.
//!
//! SQLite has no `ADD COLUMN IF NOT EXISTS`, so every change checks
//! `pragma_table_info` first. Run inside a step's transaction; SQLite DDL is
//! transactional, so a rolled-back step also undoes its column changes.

use omero_qtype_core::migration::ColumnDef;
use sqlx::SqliteConnection;

use crate::error::MigrationError;

/// Table and column existence checks and guarded `ALTER TABLE`s.
pub struct SchemaRepo;

impl SchemaRepo {
    /// Whether a table exists.
    pub async fn table_exists(
        conn: &mut SqliteConnection,
        table: &str,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count > 0)
    }

    /// Whether `table` has a column named `column`.
    pub async fn column_exists(
        conn: &mut SqliteConnection,
        table: &str,
        column: &str,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
                .bind(table)
                .bind(column)
                .fetch_one(&mut *conn)
                .await?;
        Ok(count > 0)
    }

    /// Add a column, failing with [`MigrationError::ColumnAlreadyExists`] when
    /// it is already present.
    pub async fn add_column(
        conn: &mut SqliteConnection,
        table: &str,
        column: &ColumnDef,
    ) -> Result<(), MigrationError> {
        if Self::column_exists(conn, table, column.name).await? {
            return Err(MigrationError::ColumnAlreadyExists {
                table: table.to_string(),
                column: column.name.to_string(),
            });
        }
        let sql = format!(
            "ALTER TABLE {table} ADD COLUMN {} {}",
            column.name, column.definition
        );
        sqlx::query(&sql).execute(&mut *conn).await?;
        Ok(())
    }

    /// Add a column unless it exists. Returns `true` if it was added.
    pub async fn ensure_column(
        conn: &mut SqliteConnection,
        table: &str,
        column: &ColumnDef,
    ) -> Result<bool, MigrationError> {
        match Self::add_column(conn, table, column).await {
            Ok(()) => Ok(true),
            Err(MigrationError::ColumnAlreadyExists { .. }) => {
                tracing::debug!(table, column = column.name, "Column already present");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Drop a column if it exists. Returns `true` if it was dropped.
    pub async fn drop_column_if_exists(
        conn: &mut SqliteConnection,
        table: &str,
        column: &str,
    ) -> Result<bool, sqlx::Error> {
        if !Self::column_exists(conn, table, column).await? {
            return Ok(false);
        }
        let sql = format!("ALTER TABLE {table} DROP COLUMN {column}");
        sqlx::query(&sql).execute(&mut *conn).await?;
        Ok(true)
    }
}
