//! Integration tests for the multiple-choice upgrade path.
//!
//! Every test starts from an options table in its pre-2015112400 shape in a
//! private in-memory database and drives the step runner over it.

mod common;

use assert_matches::assert_matches;
use omero_qtype_core::image_properties::{Center, ImageProperties};
use omero_qtype_core::migration::{
    BindingColumn, FOCUSABLE_ROIS_VERSION, NORMALIZE_IMAGE_URL_VERSION,
    STRUCTURED_PROPERTIES_VERSION,
};
use omero_qtype_core::qtype::QuestionType;
use omero_qtype_db::error::MigrationError;
use omero_qtype_db::models::plugin_version::UpgradeOutcome;
use omero_qtype_db::repositories::{PluginVersionRepo, QuestionOptionsRepo, UpgradeLogRepo};
use omero_qtype_db::upgrade::Upgrader;

use common::*;

const MC: QuestionType = QuestionType::MultiChoice;

const ALL_COLUMNS: &[BindingColumn] = &[
    BindingColumn::ImageLocked,
    BindingColumn::ImageProperties,
    BindingColumn::FocusableRois,
];

/// Full upgrade of a row carrying view state in its query string.
#[tokio::test]
async fn test_full_upgrade_round_trip() {
    let pool = memory_pool().await;
    create_legacy_table(&pool, MC).await;
    let id = insert_legacy(&pool, MC, "/webgateway/render_image/42?id=42&x=0.5&y=0.25&zm=10").await;

    let report = Upgrader::new(pool.clone(), MC).try_upgrade(0).await.unwrap();
    assert_eq!(report.to_version, FOCUSABLE_ROIS_VERSION);
    assert_eq!(report.steps.len(), 3);
    assert!(report.steps.iter().all(|s| s.rows == 1));

    let mut conn = pool.acquire().await.unwrap();
    let row = QuestionOptionsRepo::find_binding(&mut conn, MC.options_table(), id, ALL_COLUMNS)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.image_url, "/omero-image-repository/42");
    assert_eq!(row.image_locked, Some(false));
    assert_eq!(row.focusable_rois.as_deref(), Some(""));

    let props = ImageProperties::from_json(row.image_properties.as_deref().unwrap()).unwrap();
    assert_eq!(
        props,
        ImageProperties {
            id: 42,
            center: Center { x: 0.5, y: 0.25 },
            t: 1,
            z: 1,
            zoom_level: 10.0,
        }
    );
}

/// A reference without a query string gets no structured properties.
#[tokio::test]
async fn test_reference_without_query_keeps_properties_unset() {
    let pool = memory_pool().await;
    create_legacy_table(&pool, MC).await;
    let id = insert_legacy(&pool, MC, "/webgateway/render_image/17").await;

    assert!(Upgrader::new(pool.clone(), MC).upgrade(0).await);

    let mut conn = pool.acquire().await.unwrap();
    let row = QuestionOptionsRepo::find_binding(&mut conn, MC.options_table(), id, ALL_COLUMNS)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.image_url, "/omero-image-repository/17");
    assert_eq!(row.image_properties, None);
}

/// The id is the digit segment right before the query string.
#[tokio::test]
async fn test_image_id_extracted_from_each_row() {
    let pool = memory_pool().await;
    create_legacy_table(&pool, MC).await;
    let ids = [
        (insert_legacy(&pool, MC, "/webgateway/1?t=1&z=1&zm=12.5").await, 1),
        (insert_legacy(&pool, MC, "http://omero:8080/webgateway/render/3/250?x=0.1").await, 250),
        (insert_legacy(&pool, MC, "/omero-image-repository/9999").await, 9999),
    ];

    let upgrader = Upgrader::new(pool.clone(), MC);
    upgrader.try_upgrade(0).await.unwrap();

    for (id, image_id) in ids {
        assert_eq!(
            image_url(&pool, MC, id).await,
            format!("/omero-image-repository/{image_id}")
        );
    }
}

/// Steps at or below the stored version are never re-applied.
#[tokio::test]
async fn test_reached_versions_are_skipped() {
    let pool = memory_pool().await;
    create_legacy_table(&pool, MC).await;
    // Already in the intermediate shape: only the later steps should run.
    let id = insert_legacy(&pool, MC, "/omero-image-repository/5?id=5&zm=2").await;

    let report = Upgrader::new(pool.clone(), MC)
        .try_upgrade(NORMALIZE_IMAGE_URL_VERSION)
        .await
        .unwrap();
    let versions: Vec<_> = report.steps.iter().map(|s| s.version).collect();
    assert_eq!(versions, vec![STRUCTURED_PROPERTIES_VERSION, FOCUSABLE_ROIS_VERSION]);
    assert_eq!(image_url(&pool, MC, id).await, "/omero-image-repository/5");

    // At the final version nothing runs and nothing changes.
    sqlx::query("UPDATE qtype_omemultichoice_options SET focusablerois = 'roi_1'")
        .execute(&pool)
        .await
        .unwrap();
    let report = Upgrader::new(pool.clone(), MC)
        .try_upgrade(FOCUSABLE_ROIS_VERSION)
        .await
        .unwrap();
    assert!(report.steps.is_empty());
    assert_eq!(report.to_version, FOCUSABLE_ROIS_VERSION);

    let rois: (String,) = sqlx::query_as("SELECT focusablerois FROM qtype_omemultichoice_options")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rois.0, "roi_1");
}

/// An unparsable reference fails the step and leaves every row untouched.
#[tokio::test]
async fn test_unparsable_reference_rolls_back_step() {
    let pool = memory_pool().await;
    create_legacy_table(&pool, MC).await;
    let good = insert_legacy(&pool, MC, "/webgateway/7?zm=3").await;
    let bad = insert_legacy(&pool, MC, "/webgateway/no-image-here?zm=3").await;

    let err = Upgrader::new(pool.clone(), MC).try_upgrade(0).await.unwrap_err();
    assert_matches!(
        err,
        MigrationError::UnparsableReference { row_id, ref reference }
            if row_id == bad && reference.contains("no-image-here")
    );

    assert_eq!(image_url(&pool, MC, good).await, "/webgateway/7?zm=3");
    assert_eq!(image_url(&pool, MC, bad).await, "/webgateway/no-image-here?zm=3");

    let recorded = PluginVersionRepo::find(&pool, MC.component()).await.unwrap();
    assert!(recorded.is_none());

    let log = UpgradeLogRepo::list_by_component(&pool, MC.component()).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].outcome(), Some(UpgradeOutcome::Failed));
    assert_eq!(log[0].version, NORMALIZE_IMAGE_URL_VERSION);
}

/// Digits at the end of the query string are not taken as the image id.
#[tokio::test]
async fn test_query_digits_do_not_rewrite_reference() {
    let pool = memory_pool().await;
    create_legacy_table(&pool, MC).await;
    let good = insert_legacy(&pool, MC, "/webgateway/render_image/8?zm=1").await;
    let bad = insert_legacy(&pool, MC, "/webgateway/render_image/abc?next=/55").await;

    let err = Upgrader::new(pool.clone(), MC).try_upgrade(0).await.unwrap_err();
    assert_matches!(err, MigrationError::UnparsableReference { row_id, .. } if row_id == bad);

    assert_eq!(image_url(&pool, MC, good).await, "/webgateway/render_image/8?zm=1");
    assert_eq!(
        image_url(&pool, MC, bad).await,
        "/webgateway/render_image/abc?next=/55"
    );
    assert!(PluginVersionRepo::find(&pool, MC.component())
        .await
        .unwrap()
        .is_none());
}

/// A failing step also rolls back the columns it added.
#[tokio::test]
async fn test_failed_step_rolls_back_schema_changes() {
    let pool = memory_pool().await;
    create_legacy_table(&pool, MC).await;
    insert_legacy(&pool, MC, "/omero-image-repository/abc").await;

    let ok = Upgrader::new(pool.clone(), MC)
        .upgrade(NORMALIZE_IMAGE_URL_VERSION)
        .await;
    assert!(!ok);

    let cols = columns(&pool, MC.options_table()).await;
    assert!(cols.contains(&"answertype".to_string()));
    assert!(!cols.contains(&"omeroimagelocked".to_string()));
    assert!(!cols.contains(&"omeroimageproperties".to_string()));
}

/// A write rejected by the storage layer fails the step and rolls back rows
/// already rewritten in it.
#[tokio::test]
async fn test_forced_write_failure_rolls_back_processed_rows() {
    let pool = memory_pool().await;
    create_legacy_table(&pool, MC).await;
    let first = insert_legacy(&pool, MC, "/webgateway/1?zm=1").await;
    let second = insert_legacy(&pool, MC, "/webgateway/2?zm=2").await;
    let third = insert_legacy(&pool, MC, "/webgateway/3?zm=3").await;
    fail_updates_of(&pool, MC, second).await;

    let err = Upgrader::new(pool.clone(), MC).try_upgrade(0).await.unwrap_err();
    assert_matches!(
        err,
        MigrationError::PersistFailure { row_id, source: Some(_) } if row_id == second
    );

    assert_eq!(image_url(&pool, MC, first).await, "/webgateway/1?zm=1");
    assert_eq!(image_url(&pool, MC, second).await, "/webgateway/2?zm=2");
    assert_eq!(image_url(&pool, MC, third).await, "/webgateway/3?zm=3");
}

/// A failed step is retried by the next invocation once the data is fixed.
#[tokio::test]
async fn test_failed_step_is_retried_next_time() {
    let pool = memory_pool().await;
    create_legacy_table(&pool, MC).await;
    let bad = insert_legacy(&pool, MC, "/webgateway/broken").await;
    let upgrader = Upgrader::new(pool.clone(), MC);

    assert!(!upgrader.upgrade(0).await);

    sqlx::query("UPDATE qtype_omemultichoice_options SET omeroimageurl = ? WHERE id = ?")
        .bind("/webgateway/11?x=0.5")
        .bind(bad)
        .execute(&pool)
        .await
        .unwrap();
    assert!(upgrader.upgrade(0).await);
    assert_eq!(image_url(&pool, MC, bad).await, "/omero-image-repository/11");
}

/// Each applied step records its savepoint and an `applied` log entry.
#[tokio::test]
async fn test_savepoints_recorded_per_step() {
    let pool = memory_pool().await;
    create_legacy_table(&pool, MC).await;
    insert_legacy(&pool, MC, "/webgateway/1?zm=1").await;

    Upgrader::new(pool.clone(), MC).try_upgrade(0).await.unwrap();

    let recorded = PluginVersionRepo::find(&pool, MC.component())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(recorded.version, FOCUSABLE_ROIS_VERSION);

    let log = UpgradeLogRepo::list_by_component(&pool, MC.component()).await.unwrap();
    let versions: Vec<_> = log.iter().map(|e| e.version).collect();
    assert_eq!(
        versions,
        vec![
            NORMALIZE_IMAGE_URL_VERSION,
            STRUCTURED_PROPERTIES_VERSION,
            FOCUSABLE_ROIS_VERSION
        ]
    );
    assert!(log.iter().all(|e| e.outcome() == Some(UpgradeOutcome::Applied)));
}

/// The obsolete `answertype` column is dropped and the new columns added.
#[tokio::test]
async fn test_schema_after_upgrade() {
    let pool = memory_pool().await;
    create_legacy_table(&pool, MC).await;

    Upgrader::new(pool.clone(), MC).try_upgrade(0).await.unwrap();

    let cols = columns(&pool, MC.options_table()).await;
    assert!(!cols.contains(&"answertype".to_string()));
    for expected in ["omeroimagelocked", "omeroimageproperties", "focusablerois"] {
        assert_eq!(cols.iter().filter(|c| *c == expected).count(), 1, "{expected}");
    }
}

/// Existing structured properties survive a re-run of the properties step.
#[tokio::test]
async fn test_existing_properties_kept_without_query() {
    let pool = memory_pool().await;
    create_legacy_table(&pool, MC).await;
    let id = insert_legacy(&pool, MC, "/omero-image-repository/8").await;
    sqlx::query(
        "ALTER TABLE qtype_omemultichoice_options ADD COLUMN omeroimageproperties TEXT NULL",
    )
    .execute(&pool)
    .await
    .unwrap();
    let stored = r#"{"id":8,"center":{"x":0.1,"y":0.2},"t":1,"z":1,"zoom_level":4.0}"#;
    sqlx::query("UPDATE qtype_omemultichoice_options SET omeroimageproperties = ?")
        .bind(stored)
        .execute(&pool)
        .await
        .unwrap();

    Upgrader::new(pool.clone(), MC)
        .try_upgrade(NORMALIZE_IMAGE_URL_VERSION)
        .await
        .unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let row = QuestionOptionsRepo::find_binding(&mut conn, MC.options_table(), id, ALL_COLUMNS)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.image_properties.as_deref(), Some(stored));
}
