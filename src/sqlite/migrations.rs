//! Embedded migrations for `SQLite`.
//!
//! The SQL files under `migrations_sqlite/` are compiled into the binary and
//! applied in order, each at most once, tracked in `_chorepool_migrations`.
//!
//! ```rust,ignore
//! use chorepool::sqlite::migrations;
//!
//! migrations::run(&pool).await?;
//! ```

use sqlx::{Executor, SqlitePool};

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "20250301000001_create_users_table",
        include_str!("../../migrations_sqlite/20250301000001_create_users_table.sql"),
    ),
    (
        "20250301000002_create_groups_table",
        include_str!("../../migrations_sqlite/20250301000002_create_groups_table.sql"),
    ),
    (
        "20250301000003_create_tasks_table",
        include_str!("../../migrations_sqlite/20250301000003_create_tasks_table.sql"),
    ),
];

/// Applies every pending migration.
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    pool.execute(
        r"
        CREATE TABLE IF NOT EXISTS _chorepool_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        ",
    )
    .await?;

    for (name, sql) in MIGRATIONS {
        let applied: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM _chorepool_migrations WHERE name = ?)",
        )
        .bind(*name)
        .fetch_one(pool)
        .await?;

        if applied {
            continue;
        }

        // statements are split on ';', so migrations must not put one inside a literal
        let mut tx = pool.begin().await?;
        for statement in sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                (&mut *tx).execute(trimmed).await?;
            }
        }
        sqlx::query("INSERT INTO _chorepool_migrations (name) VALUES (?)")
            .bind(*name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        log::info!(target: "chorepool", "msg=\"migration applied\", name=\"{name}\"");
    }

    Ok(())
}
