// ABOUTME: Database connection management
// ABOUTME: Opens the SQLite pool, applies pragmas and runs embedded migrations

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::StorageError;

/// Open (creating if needed) the SQLite database and run migrations.
///
/// Falls back to `~/.tasklane/tasklane.db` when no path is given.
pub async fn connect(database_path: Option<PathBuf>) -> Result<SqlitePool, StorageError> {
    let database_path = database_path.unwrap_or_else(tasklane_core::default_database_path);

    // Ensure parent directory exists
    if let Some(parent) = database_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let database_url = format!("sqlite:{}", database_path.display());
    debug!("Connecting to database: {}", database_url);

    let options = SqliteConnectOptions::from_str(&database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await?;

    info!("Database connection established");

    migrate(&pool).await?;
    Ok(pool)
}

/// In-memory database with migrations applied.
///
/// Limited to one connection: every SQLite in-memory connection is a separate database.
pub async fn connect_in_memory() -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    debug!("Database migrations completed");
    Ok(())
}
