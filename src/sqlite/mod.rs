//! `SQLite` storage backends. Enable the `sqlx_sqlite` feature to use them.
//!
//! `SQLite` allows one writer at a time. Every ledger transaction opens with a
//! write statement against the group row, so the database write lock is held
//! from the first read of the pool to the commit.

mod ledger;
pub mod migrations;
mod user;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

pub use ledger::SqliteLedgerRepository;
pub use user::SqliteUserRepository;

use crate::ChoreError;

/// Opens a pool with foreign keys enforced and WAL journaling, creating the
/// database file if needed.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
}

pub fn create_repositories(pool: SqlitePool) -> (SqliteUserRepository, SqliteLedgerRepository) {
    (
        SqliteUserRepository::new(pool.clone()),
        SqliteLedgerRepository::new(pool),
    )
}

pub(crate) fn database_error(operation: &str, e: sqlx::Error) -> ChoreError {
    log::error!(
        target: "chorepool",
        "msg=\"database error\", backend=\"sqlite\", operation=\"{operation}\", error=\"{e}\""
    );
    ChoreError::DatabaseError(e.to_string())
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
