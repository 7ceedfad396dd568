use anyhow::{Context, Result};
use sqlx::Row;
use wallet_manager::{
    config::Config,
    infrastructure::{db, logging},
};

/// 已应用的迁移版本
async fn applied_versions(pool: &db::PgPool) -> Result<Vec<i64>> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;
    if !exists {
        return Ok(Vec::new());
    }

    let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success ORDER BY version")
        .fetch_all(pool)
        .await?;
    rows.iter()
        .map(|row| row.try_get::<i64, _>("version").map_err(Into::into))
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;
    config.validate().context("invalid configuration")?;
    logging::init_logging(&config.logging)?;

    let pool = db::init_pool(&config.database)
        .await
        .context("failed to connect to database")?;

    let migrator = sqlx::migrate!("./migrations");
    let applied = applied_versions(&pool).await?;
    for migration in migrator.iter() {
        if !applied.contains(&migration.version) {
            tracing::info!(
                version = migration.version,
                description = %migration.description,
                "Pending migration"
            );
        }
    }

    migrator.run(&pool).await?;
    tracing::info!("Migration runner finished successfully");
    Ok(())
}
