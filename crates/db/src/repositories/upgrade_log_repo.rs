//! Repository for the `upgrade_log` table.

use omero_qtype_core::types::{DbId, Version};
use sqlx::{Executor, Sqlite};

use crate::models::plugin_version::{UpgradeLogEntry, UpgradeOutcome};

/// Column list for upgrade_log queries.
const COLUMNS: &str = "id, component, version, outcome, info, details, created_at";

/// Append-only log of install and upgrade attempts.
pub struct UpgradeLogRepo;

impl UpgradeLogRepo {
    /// Append one entry, returning its id.
    pub async fn record<'e, E>(
        executor: E,
        component: &str,
        version: Version,
        outcome: UpgradeOutcome,
        info: &str,
        details: Option<&str>,
    ) -> Result<DbId, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO upgrade_log (component, version, outcome, info, details, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(component)
        .bind(version)
        .bind(outcome.as_str())
        .bind(info)
        .bind(details)
        .bind(chrono::Utc::now())
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    /// All entries of a component, oldest first.
    pub async fn list_by_component<'e, E>(
        executor: E,
        component: &str,
    ) -> Result<Vec<UpgradeLogEntry>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM upgrade_log
             WHERE component = ?
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, UpgradeLogEntry>(&query)
            .bind(component)
            .fetch_all(executor)
            .await
    }
}
