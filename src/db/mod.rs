pub mod content;
pub mod credentials;
pub mod models;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;
use thiserror::Error;

use crate::state::DbPool;

pub use content::{ContentStore, SqliteContentStore};
pub use credentials::{CredentialStore, SqliteCredentialStore};

pub type Migration = (&'static str, &'static str);

pub const CONTENT_MIGRATIONS: &[Migration] = &[(
    "001_initial",
    include_str!("../../migrations/content/001_initial.sql"),
)];

pub const CREDENTIAL_MIGRATIONS: &[Migration] = &[(
    "001_initial",
    include_str!("../../migrations/credentials/001_initial.sql"),
)];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Record changed concurrently: {0}")]
    StaleWrite(String),
}

impl StoreError {
    /// Maps a SQLite uniqueness violation to `Conflict`, leaving other errors as they are.
    pub fn from_insert(err: rusqlite::Error, what: &str) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(what.to_string())
            }
            other => StoreError::Sql(other),
        }
    }
}

pub fn create_pool(db_path: &Path) -> anyhow::Result<DbPool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )
    });
    let pool = Pool::builder().max_size(8).build(manager)?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool, migrations: &[Migration]) -> anyhow::Result<()> {
    let conn = pool.get()?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in migrations {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_version WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        if !already_applied {
            tracing::info!("Applying migration: {}", name);
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO schema_version (name) VALUES (?1)",
                params![name],
            )?;
        }
    }

    Ok(())
}

/// Opens a pool at `path` and brings its schema up to date.
pub fn open_store(path: &Path, migrations: &[Migration]) -> anyhow::Result<DbPool> {
    let pool = create_pool(path)?;
    run_migrations(&pool, migrations)?;
    tracing::info!("Store ready: {}", path.display());
    Ok(pool)
}

#[cfg(test)]
pub(crate) fn memory_pool(migrations: &[Migration]) -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    run_migrations(&pool, migrations).unwrap();
    pool
}
