#![allow(dead_code)]

use omero_qtype_core::qtype::QuestionType;
use omero_qtype_core::types::DbId;
use omero_qtype_db::DbPool;
use sqlx::sqlite::SqlitePoolOptions;

/// A private in-memory database. One connection, so every query and every
/// transaction sees the same database.
pub async fn memory_pool() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    omero_qtype_db::run_migrations(&pool)
        .await
        .expect("bookkeeping migrations");
    pool
}

/// Create an options table in its pre-2015112400 shape.
pub async fn create_legacy_table(pool: &DbPool, qtype: QuestionType) {
    let sql = format!(
        "CREATE TABLE {} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            questionid INTEGER NOT NULL DEFAULT 0,
            single INTEGER NOT NULL DEFAULT 1,
            answertype INTEGER NOT NULL DEFAULT 0,
            omeroimageurl TEXT NOT NULL
        )",
        qtype.options_table()
    );
    sqlx::query(&sql).execute(pool).await.unwrap();
}

/// Insert a legacy row, returning its id.
pub async fn insert_legacy(pool: &DbPool, qtype: QuestionType, url: &str) -> DbId {
    let sql = format!(
        "INSERT INTO {} (omeroimageurl) VALUES (?) RETURNING id",
        qtype.options_table()
    );
    let row: (DbId,) = sqlx::query_as(&sql).bind(url).fetch_one(pool).await.unwrap();
    row.0
}

/// Read `omeroimageurl` of a row.
pub async fn image_url(pool: &DbPool, qtype: QuestionType, id: DbId) -> String {
    let sql = format!(
        "SELECT omeroimageurl FROM {} WHERE id = ?",
        qtype.options_table()
    );
    let row: (String,) = sqlx::query_as(&sql).bind(id).fetch_one(pool).await.unwrap();
    row.0
}

/// Column names of a table, in declaration order.
pub async fn columns(pool: &DbPool, table: &str) -> Vec<String> {
    sqlx::query_scalar("SELECT name FROM pragma_table_info(?) ORDER BY cid")
        .bind(table)
        .fetch_all(pool)
        .await
        .unwrap()
}

/// Make every update of row `id` fail inside the storage layer.
pub async fn fail_updates_of(pool: &DbPool, qtype: QuestionType, id: DbId) {
    let sql = format!(
        "CREATE TRIGGER fail_update_{id} BEFORE UPDATE ON {table}
         WHEN OLD.id = {id}
         BEGIN
             SELECT RAISE(ABORT, 'forced write failure');
         END",
        table = qtype.options_table()
    );
    sqlx::query(&sql).execute(pool).await.unwrap();
}
