mod config;

use std::process::ExitCode;

use omero_qtype_db::upgrade::Upgrader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::UpgradeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "omero_qtype_upgrade=info,omero_qtype_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = UpgradeConfig::from_env()?;
    tracing::info!(
        database_url = %config.database_url,
        qtypes = ?config.question_types,
        "Starting question type upgrade"
    );

    let pool = omero_qtype_db::create_pool(&config.database_url, config.max_connections).await?;
    omero_qtype_db::health_check(&pool).await?;
    omero_qtype_db::run_migrations(&pool).await?;

    let mut failed = 0;
    for qtype in &config.question_types {
        match Upgrader::new(pool.clone(), *qtype).upgrade_installed().await {
            Ok(report) => tracing::info!(
                component = report.component,
                from_version = report.from_version,
                to_version = report.to_version,
                installed = report.installed,
                steps = report.steps.len(),
                "Question type up to date"
            ),
            Err(err) => {
                tracing::error!(
                    component = qtype.component(),
                    error = %err,
                    "Question type upgrade failed"
                );
                failed += 1;
            }
        }
    }

    pool.close().await;

    if failed > 0 {
        tracing::error!(failed, "Upgrade incomplete; rerun to retry the failed steps");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
