//! Postgres migrations, embedded from `migrations/` by `sqlx::migrate!`.
//!
//! ```rust,ignore
//! use chorepool::postgres::migrations;
//!
//! migrations::run(&pool).await?;
//! ```

use sqlx::PgPool;

/// Creates `users`, `groups` and `tasks`.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
