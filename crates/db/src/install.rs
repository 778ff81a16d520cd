//! Fresh install of a question type's options table at the current schema.

use omero_qtype_core::migration::{ColumnDef, ANSWER_TYPE_COLUMN};
use omero_qtype_core::qtype::QuestionType;
use sqlx::SqliteConnection;

use crate::error::MigrationError;
use crate::models::plugin_version::UpgradeOutcome;
use crate::repositories::{PluginVersionRepo, SchemaRepo, UpgradeLogRepo};
use crate::DbPool;

/// Columns every options table had at its first release.
const BASE_COLUMNS: &[ColumnDef] = &[
    ColumnDef {
        name: "questionid",
        definition: "INTEGER NOT NULL DEFAULT 0",
    },
    ColumnDef {
        name: "layout",
        definition: "INTEGER NOT NULL DEFAULT 0",
    },
    ColumnDef {
        name: "single",
        definition: "INTEGER NOT NULL DEFAULT 0",
    },
    ColumnDef {
        name: "shuffleanswers",
        definition: "INTEGER NOT NULL DEFAULT 1",
    },
    ColumnDef {
        name: "correctfeedback",
        definition: "TEXT NOT NULL DEFAULT ''",
    },
    ColumnDef {
        name: "partiallycorrectfeedback",
        definition: "TEXT NOT NULL DEFAULT ''",
    },
    ColumnDef {
        name: "incorrectfeedback",
        definition: "TEXT NOT NULL DEFAULT ''",
    },
    ColumnDef {
        name: "answernumbering",
        definition: "TEXT NOT NULL DEFAULT 'abc'",
    },
    ColumnDef {
        name: "shownumcorrect",
        definition: "INTEGER NOT NULL DEFAULT 0",
    },
    ColumnDef {
        name: ANSWER_TYPE_COLUMN,
        definition: "INTEGER NOT NULL DEFAULT 0",
    },
    ColumnDef {
        name: "omeroimageurl",
        definition: "TEXT NOT NULL DEFAULT ''",
    },
];

/// `CREATE TABLE` statement of the options table at the current schema: the
/// base columns minus those the upgrade steps drop, plus those they add.
/// A fresh table therefore matches one brought up to date by the upgrader.
pub fn create_table_sql(qtype: QuestionType) -> String {
    let steps = qtype.steps();
    let dropped: Vec<&str> = steps
        .iter()
        .flat_map(|step| step.dropped_columns().iter().copied())
        .collect();
    let columns = BASE_COLUMNS
        .iter()
        .filter(|c| !dropped.contains(&c.name))
        .chain(steps.iter().flat_map(|step| step.added_columns()))
        .map(|c| format!("    {} {}", c.name, c.definition))
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        "CREATE TABLE {} (\n    id INTEGER PRIMARY KEY AUTOINCREMENT,\n{columns}\n)",
        qtype.options_table()
    )
}

/// Create the options table when it is missing and record the current
/// version. Returns `false` when the table already existed (nothing changed).
pub async fn install(pool: &DbPool, qtype: QuestionType) -> Result<bool, MigrationError> {
    let mut tx = pool.begin().await?;

    if !create_options_table(&mut *tx, qtype).await? {
        tx.rollback().await?;
        tracing::debug!(component = qtype.component(), "Options table already installed");
        return Ok(false);
    }

    let version = qtype.current_version();
    PluginVersionRepo::record_savepoint(&mut *tx, qtype.component(), version).await?;
    UpgradeLogRepo::record(
        &mut *tx,
        qtype.component(),
        version,
        UpgradeOutcome::Installed,
        &format!("Created {}", qtype.options_table()),
        None,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(component = qtype.component(), version, "Question type installed");
    Ok(true)
}

async fn create_options_table(
    conn: &mut SqliteConnection,
    qtype: QuestionType,
) -> Result<bool, MigrationError> {
    if SchemaRepo::table_exists(conn, qtype.options_table()).await? {
        return Ok(false);
    }
    sqlx::query(&create_table_sql(qtype))
        .execute(&mut *conn)
        .await?;
    Ok(true)
}
