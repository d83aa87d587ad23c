use std::path::Path;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use triggermesh_core::AppError;

const MAX_CONNECTIONS: u32 = 25;
const CONNECTION_MAX_LIFETIME: Duration = Duration::from_secs(5 * 60);

/// Opens the audit database file, creating it when missing, and applies migrations.
pub async fn connect_and_migrate(database_path: &str) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::new()
        .filename(Path::new(database_path))
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .max_lifetime(CONNECTION_MAX_LIFETIME)
        .connect_with(options)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to open database '{database_path}': {error}"
            ))
        })?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Applies pending schema migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))
}
