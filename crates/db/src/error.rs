use omero_qtype_core::error::CoreError;
use omero_qtype_core::types::DbId;

/// Failure of an install or upgrade step. Any of these rolls the step back.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The stored image reference has no extractable numeric id.
    #[error("Unable to detect the image id of question options {row_id}: {reference}")]
    UnparsableReference { row_id: DbId, reference: String },

    /// A strict column add found the column already present.
    #[error("Column {table}.{column} already exists")]
    ColumnAlreadyExists { table: String, column: String },

    /// The storage layer rejected a row write.
    #[error("Error during question update: {row_id}")]
    PersistFailure {
        row_id: DbId,
        #[source]
        source: Option<sqlx::Error>,
    },

    #[error("Failed to encode image properties: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Core(CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bookkeeping migration error: {0}")]
    Bootstrap(#[from] sqlx::migrate::MigrateError),
}

impl MigrationError {
    /// Attach the row being migrated to a domain error.
    pub fn for_row(row_id: DbId, err: CoreError) -> Self {
        match err {
            CoreError::UnparsableReference(reference) => {
                Self::UnparsableReference { row_id, reference }
            }
            CoreError::Serialization(err) => Self::Encode(err),
            other => Self::Core(other),
        }
    }
}
