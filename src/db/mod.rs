pub mod seed;
pub mod tenant;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run the public-schema migrations embedded in ./migrations/
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Re-provision all active academy schemas (idempotent).
pub async fn migrate_all_existing_academies(pool: &PgPool) -> anyhow::Result<()> {
    let slugs: Vec<String> =
        sqlx::query_scalar("SELECT slug FROM public.academies WHERE is_active = TRUE")
            .fetch_all(pool)
            .await?;

    for slug in slugs {
        tenant::provision_academy_schema(pool, &slug).await?;
        tracing::info!("Migrated academy schema: {}", tenant::schema_name(&slug));
    }
    Ok(())
}
