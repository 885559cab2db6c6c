//! Postgres storage backends. Enable the `sqlx_postgres` feature to use them.
//!
//! Ledger transactions lock the group row with `SELECT ... FOR UPDATE`, then
//! the task row, so transitions on one group are serialized while different
//! groups commit in parallel.

mod ledger;
pub mod migrations;
mod user;

pub use ledger::PostgresLedgerRepository;
pub use user::PostgresUserRepository;

use sqlx::PgPool;

use crate::ChoreError;

pub fn create_repositories(pool: PgPool) -> (PostgresUserRepository, PostgresLedgerRepository) {
    (
        PostgresUserRepository::new(pool.clone()),
        PostgresLedgerRepository::new(pool),
    )
}

pub(crate) fn database_error(operation: &str, e: sqlx::Error) -> ChoreError {
    log::error!(
        target: "chorepool",
        "msg=\"database error\", backend=\"postgres\", operation=\"{operation}\", error=\"{e}\""
    );
    ChoreError::DatabaseError(e.to_string())
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
