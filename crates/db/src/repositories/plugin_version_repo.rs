//! Repository for the `plugin_versions` table.

use omero_qtype_core::types::Version;
use sqlx::{Executor, Sqlite};

use crate::models::plugin_version::PluginVersion;

/// Column list for plugin_versions queries.
const COLUMNS: &str = "component, version, updated_at";

/// Reads and records the schema savepoint of each component.
pub struct PluginVersionRepo;

impl PluginVersionRepo {
    /// Find the recorded version of a component.
    pub async fn find<'e, E>(
        executor: E,
        component: &str,
    ) -> Result<Option<PluginVersion>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let query = format!("SELECT {COLUMNS} FROM plugin_versions WHERE component = ?");
        sqlx::query_as::<_, PluginVersion>(&query)
            .bind(component)
            .fetch_optional(executor)
            .await
    }

    /// Record that `component` reached `version`.
    pub async fn record_savepoint<'e, E>(
        executor: E,
        component: &str,
        version: Version,
    ) -> Result<PluginVersion, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "INSERT INTO plugin_versions (component, version, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT (component) DO UPDATE SET
                version = excluded.version,
                updated_at = excluded.updated_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PluginVersion>(&query)
            .bind(component)
            .bind(version)
            .bind(chrono::Utc::now())
            .fetch_one(executor)
            .await
    }
}
