use crate::error::Result;
use sqlx::{Executor, PgPool};
use tracing::info;

/// Run all database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    create_migrations_table(pool).await?;

    for (version, name, sql) in get_migrations() {
        if !is_migration_applied(pool, version).await? {
            info!(version = version, name = name, "Applying migration");

            // Multi-statement migrations go through the simple query protocol
            pool.execute(sql).await?;

            record_migration(pool, version, name).await?;

            info!(version = version, name = name, "Migration applied successfully");
        }
    }

    Ok(())
}

/// Create the migrations tracking table
async fn create_migrations_table(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Check if a migration has been applied
async fn is_migration_applied(pool: &PgPool, version: i32) -> Result<bool> {
    let result = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM schema_migrations WHERE version = $1",
    )
    .bind(version)
    .fetch_one(pool)
    .await?;

    Ok(result > 0)
}

/// Record a migration as applied
async fn record_migration(pool: &PgPool, version: i32, name: &str) -> Result<()> {
    sqlx::query("INSERT INTO schema_migrations (version, name) VALUES ($1, $2)")
        .bind(version)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Get all migrations in order
fn get_migrations() -> Vec<(i32, &'static str, &'static str)> {
    vec![(1, "items_table", MIGRATION_001_ITEMS_TABLE)]
}

// Migration 1: Items table
const MIGRATION_001_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    title VARCHAR(100) NOT NULL CHECK (length(title) > 0),
    description VARCHAR(500),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_items_created_at ON items(created_at DESC);

-- Updated_at trigger
CREATE OR REPLACE FUNCTION update_updated_at_column()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ language 'plpgsql';

DROP TRIGGER IF EXISTS update_items_updated_at ON items;
CREATE TRIGGER update_items_updated_at
    BEFORE UPDATE ON items
    FOR EACH ROW
    EXECUTE FUNCTION update_updated_at_column();
"#;
