use anyhow::{Context, Result};
use avaluos_core::Config;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::time::Duration;

/// Open the connection pool for `DATABASE_URL` and bring the schema up to date
pub async fn connect(config: &Config) -> Result<PgPool> {
    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required for this command")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .connect(url)
        .await
        .context("Could not connect to Postgres")?;
    tracing::info!(
        max_connections = config.db_max_connections,
        "Postgres pool ready"
    );

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Apply pending migrations from the workspace `migrations/` directory
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = Migrator::new(dir)
        .await
        .context("Could not read migrations")?;
    migrator
        .run(pool)
        .await
        .context("Migration failed")?;

    tracing::info!(count = migrator.iter().count(), "Migrations applied");
    Ok(())
}
