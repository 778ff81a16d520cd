//! Bookkeeping models: recorded schema versions and the upgrade log.

use chrono::{DateTime, Utc};
use omero_qtype_core::types::{DbId, Version};
use serde::Serialize;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A row from `plugin_versions`: the savepoint reached by one component.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PluginVersion {
    pub component: String,
    pub version: Version,
    pub updated_at: DateTime<Utc>,
}

/// A row from `upgrade_log`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UpgradeLogEntry {
    pub id: DbId,
    pub component: String,
    pub version: Version,
    pub outcome: String,
    pub info: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What happened to one install or upgrade attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeOutcome {
    Installed,
    Applied,
    Failed,
}

impl UpgradeOutcome {
    /// Return the outcome name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installed => "installed",
            Self::Applied => "applied",
            Self::Failed => "failed",
        }
    }

    /// Parse an outcome string. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "installed" => Some(Self::Installed),
            "applied" => Some(Self::Applied),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for UpgradeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl UpgradeLogEntry {
    /// Typed outcome of this entry, `None` if the stored value is unknown.
    pub fn outcome(&self) -> Option<UpgradeOutcome> {
        UpgradeOutcome::from_str(&self.outcome)
    }
}
