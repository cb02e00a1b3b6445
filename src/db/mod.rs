pub mod repository;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::info;

use crate::error::StoreError;

pub use repository::ScheduleStore;

/// Opens (creating if needed) the store file for `term` under `dir`.
pub async fn open_term_store(dir: &Path, term: u32) -> Result<ScheduleStore, StoreError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{}.db", term));
    info!("opening schedule store {}", path.display());

    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(ScheduleStore::new(pool, term))
}

/// Single-connection in-memory store; every connection to `:memory:` is a
/// separate database, so the pool must never open a second one.
pub async fn open_in_memory(term: u32) -> Result<ScheduleStore, StoreError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(ScheduleStore::new(pool, term))
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
