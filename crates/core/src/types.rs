/// Question-options primary keys are SQLite INTEGER rowids.
pub type DbId = i64;

/// Plugin schema versions use the host's `YYYYMMDDXX` convention.
pub type Version = i64;
