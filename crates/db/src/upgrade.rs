//! Versioned upgrade of the question options tables.
//!
//! Every pending step runs in its own transaction: add missing columns, read
//! all rows, rewrite each one, record the savepoint, commit. Any failure rolls
//! the whole step back (rows and column changes alike) and stops the run, so a
//! later invocation retries that exact step.

use omero_qtype_core::migration::{pending_steps, MigrationStep};
use omero_qtype_core::qtype::QuestionType;
use omero_qtype_core::types::Version;
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::error::MigrationError;
use crate::install::install;
use crate::models::plugin_version::UpgradeOutcome;
use crate::repositories::{PluginVersionRepo, QuestionOptionsRepo, SchemaRepo, UpgradeLogRepo};
use crate::DbPool;

/// Result of one applied step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub version: Version,
    pub step: &'static str,
    /// Rows rewritten by the step.
    pub rows: u64,
}

/// Result of one upgrade call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeReport {
    pub component: &'static str,
    pub from_version: Version,
    pub to_version: Version,
    /// Whether the options table was created rather than upgraded.
    pub installed: bool,
    pub steps: Vec<StepReport>,
}

/// Runs the upgrade steps of one question type.
pub struct Upgrader {
    pool: DbPool,
    question_type: QuestionType,
}

impl Upgrader {
    pub fn new(pool: DbPool, question_type: QuestionType) -> Self {
        Self {
            pool,
            question_type,
        }
    }

    /// Bring the options table up to date from `old_version`.
    ///
    /// Returns `false` if any step failed; that step has been rolled back and
    /// the failure logged.
    pub async fn upgrade(&self, old_version: Version) -> bool {
        match self.try_upgrade(old_version).await {
            Ok(report) => {
                tracing::info!(
                    component = report.component,
                    from_version = report.from_version,
                    to_version = report.to_version,
                    steps = report.steps.len(),
                    "Upgrade finished"
                );
                true
            }
            Err(err) => {
                tracing::error!(
                    component = self.question_type.component(),
                    old_version,
                    error = %err,
                    "Upgrade failed"
                );
                false
            }
        }
    }

    /// Apply every step newer than `old_version`, oldest first, stopping at
    /// the first failure.
    pub async fn try_upgrade(&self, old_version: Version) -> Result<UpgradeReport, MigrationError> {
        crate::run_migrations(&self.pool).await?;

        let qtype = self.question_type;
        for step in qtype.steps().iter().filter(|s| s.version() <= old_version) {
            tracing::debug!(
                component = qtype.component(),
                version = step.version(),
                step = %step,
                "Step already applied, skipping"
            );
        }

        let mut report = UpgradeReport {
            component: qtype.component(),
            from_version: old_version,
            to_version: old_version,
            installed: false,
            steps: Vec::new(),
        };
        for step in pending_steps(qtype.steps(), old_version) {
            let applied = self.run_step(step).await?;
            report.to_version = applied.version;
            report.steps.push(applied);
        }
        Ok(report)
    }

    /// Upgrade from the recorded version. A table with no recorded version is
    /// treated as predating every step; a missing table is installed fresh.
    pub async fn upgrade_installed(&self) -> Result<UpgradeReport, MigrationError> {
        crate::run_migrations(&self.pool).await?;

        let qtype = self.question_type;
        let recorded = PluginVersionRepo::find(&self.pool, qtype.component()).await?;
        if let Some(recorded) = recorded {
            return self.try_upgrade(recorded.version).await;
        }

        if install(&self.pool, qtype).await? {
            return Ok(UpgradeReport {
                component: qtype.component(),
                from_version: 0,
                to_version: qtype.current_version(),
                installed: true,
                steps: Vec::new(),
            });
        }

        tracing::warn!(
            component = qtype.component(),
            "Options table exists without a recorded version, upgrading from scratch"
        );
        self.try_upgrade(0).await
    }

    async fn run_step(&self, step: MigrationStep) -> Result<StepReport, MigrationError> {
        let qtype = self.question_type;
        let component = qtype.component();
        let version = step.version();
        tracing::info!(component, version, step = %step, "Applying upgrade step");

        let mut tx = self.pool.begin().await?;

        let rows = match apply_step(&mut *tx, qtype, step).await {
            Ok(rows) => rows,
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(component, version, error = %rollback_err, "Rollback failed");
                }
                tracing::error!(
                    component,
                    version,
                    step = %step,
                    error = %err,
                    "Upgrade step rolled back"
                );
                let details = err.to_string();
                if let Err(log_err) = UpgradeLogRepo::record(
                    &self.pool,
                    component,
                    version,
                    UpgradeOutcome::Failed,
                    step.as_str(),
                    Some(&details),
                )
                .await
                {
                    tracing::warn!(
                        component,
                        version,
                        error = %log_err,
                        "Could not log failed step"
                    );
                }
                return Err(err);
            }
        };

        PluginVersionRepo::record_savepoint(&mut *tx, component, version).await?;
        UpgradeLogRepo::record(
            &mut *tx,
            component,
            version,
            UpgradeOutcome::Applied,
            step.as_str(),
            Some(&format!("{rows} rows migrated")),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(component, version, step = %step, rows, "Upgrade step applied");
        Ok(StepReport {
            version,
            step: step.as_str(),
            rows,
        })
    }
}

/// Schema changes plus the read-modify-write loop of one step. Runs on the
/// step's transaction; the caller commits or rolls back.
async fn apply_step(
    conn: &mut SqliteConnection,
    qtype: QuestionType,
    step: MigrationStep,
) -> Result<u64, MigrationError> {
    let table = qtype.options_table();

    for column in step.added_columns() {
        if SchemaRepo::ensure_column(conn, table, column).await? {
            tracing::info!(table, column = column.name, "Column added");
        }
    }
    for column in step.dropped_columns() {
        if SchemaRepo::drop_column_if_exists(conn, table, column).await? {
            tracing::info!(table, column, "Column dropped");
        }
    }

    let records = QuestionOptionsRepo::list_bindings(conn, table, step.read_columns()).await?;
    let mut rows = 0;
    for record in records {
        let row_id = record.id;
        let migrated = step
            .apply(record)
            .map_err(|err| MigrationError::for_row(row_id, err))?;

        match QuestionOptionsRepo::update_binding(conn, table, &migrated, step.written_columns())
            .await
        {
            Ok(0) => {
                return Err(MigrationError::PersistFailure {
                    row_id,
                    source: None,
                })
            }
            Ok(_) => rows += 1,
            Err(err) => {
                return Err(MigrationError::PersistFailure {
                    row_id,
                    source: Some(err),
                })
            }
        }
    }
    Ok(rows)
}
