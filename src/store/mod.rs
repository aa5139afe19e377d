//! SQLite pool setup and the additive startup migration.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::error::Error;

pub mod predictions;
pub mod users;

/// Open (creating if missing) the database file. Foreign keys are enforced
/// on every pooled connection.
pub async fn connect(path: &Path) -> Result<SqlitePool, Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// In-memory store for tests. A single connection keeps every query on the
/// same database.
pub async fn connect_in_memory() -> Result<SqlitePool, Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Bring the schema up to date. Additive and idempotent: safe to run on
/// every startup against an existing database. A failure here is fatal to
/// startup; the process must not serve traffic on an inconsistent schema.
pub async fn migrate(pool: &SqlitePool) -> Result<(), Error> {
    info!("running startup migration");

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS predictions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            sepal_length REAL NOT NULL,
            sepal_width REAL NOT NULL,
            petal_length REAL NOT NULL,
            petal_width REAL NOT NULL,
            prediction_id INTEGER NOT NULL,
            label TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        ",
    )
    .execute(pool)
    .await?;

    // Databases written by earlier revisions may predate these columns.
    let columns: Vec<String> = sqlx::query("PRAGMA table_info(users)")
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| row.get("name"))
        .collect();

    if !columns.iter().any(|name| name == "updated_at") {
        sqlx::query("ALTER TABLE users ADD COLUMN updated_at TEXT")
            .execute(pool)
            .await?;
        sqlx::query("UPDATE users SET updated_at = created_at WHERE updated_at IS NULL")
            .execute(pool)
            .await?;
    }

    if !columns.iter().any(|name| name == "role") {
        sqlx::query("ALTER TABLE users ADD COLUMN role TEXT NOT NULL DEFAULT 'user'")
            .execute(pool)
            .await?;
    }

    sqlx::query("UPDATE users SET role = 'user' WHERE role IS NULL OR role = ''")
        .execute(pool)
        .await?;

    Ok(())
}
