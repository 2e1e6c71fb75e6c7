//! DCB Schema Ownership
//!
//! The core owns and applies its own migrations for the `events` relation
//! via `sqlx::migrate!`; it is not a general migration-authoring tool for
//! caller-defined schemas, that remains the caller's concern.

use sqlx::PgPool;
use tracing::{info, warn};

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Run all pending migrations against `pool`. Idempotent: safe to call on
/// every process start.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    info!("running DCB event log migrations");
    sqlx::migrate!("../migrations").run(pool).await?;
    info!("migrations up to date");
    Ok(())
}

/// Check connectivity and report the latest applied migration version,
/// without running anything. Useful for a host process's startup checks.
pub async fn status(pool: &PgPool) -> Result<()> {
    let result: i64 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    if result != 1 {
        return Err(anyhow::anyhow!("database connectivity check failed"));
    }
    info!("database connectivity: OK");

    let rows = sqlx::query_as::<_, (i64, String, bool)>(
        "SELECT version, description, success FROM _sqlx_migrations ORDER BY version DESC LIMIT 10",
    )
    .fetch_all(pool)
    .await;

    match rows {
        Ok(migrations) if !migrations.is_empty() => {
            for (version, description, success) in migrations {
                let mark = if success { "ok" } else { "FAILED" };
                info!("  {} v{}: {}", mark, version, description);
            }
        }
        Ok(_) => warn!("no migrations recorded yet; call migrate() first"),
        Err(e) if e.to_string().contains("_sqlx_migrations") => {
            warn!("migration table not found; call migrate() first");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    // Exercised against a real database by dcb-testkit's integration
    // tests; schema/migration correctness isn't unit-testable without one.
}
