/// Database migration runner
///
/// Migrations live in the `migrations/` directory at the workspace root and
/// are applied through sqlx's migration system at startup, before the
/// server begins accepting requests.

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Runs all pending database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    let migrations = sqlx::migrate!("../migrations");

    match migrations.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}
