//! chorepool server.
//!
//! Environment variables:
//!   DATABASE_URL=sqlite:./chorepool.db (default)
//!   CHOREPOOL_ADDR=0.0.0.0:8437 (default)
//!   RUST_LOG=info (default)
//!   CHOREPOOL_* for sessions, rate limits and sweeping (see `ChorepoolConfig`)
//!
//! Every route lives under `/api/v1`:
//!   curl -X POST http://localhost:8437/api/v1/register \
//!     -H "Content-Type: application/json" \
//!     -d '{"username": "alice", "password": "correct horse"}'

use std::net::SocketAddr;
use std::sync::Arc;

use chorepool::actions::SweepExpiredAction;
use chorepool::api::axum::{app, cors_for_origin, AppState};
use chorepool::events::listeners::{LoggingListener, TracingListener};
use chorepool::rate_limit::{InMemoryStore, RateGovernor};
use chorepool::session::{InMemorySessionStore, SessionStore};
use chorepool::sqlite::{connect, create_repositories, migrations};
use chorepool::{register_event_listeners, ChorepoolConfig};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const DEFAULT_DATABASE_URL: &str = "sqlite:./chorepool.db";
const DEFAULT_ADDR: &str = "0.0.0.0:8437";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ChorepoolConfig::from_env();
    config.session.validate()?;

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned());
    let addr: SocketAddr = std::env::var("CHOREPOOL_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_owned())
        .parse()?;

    let pool = connect(&database_url).await?;
    migrations::run(&pool).await?;
    let (user_repo, ledger) = create_repositories(pool);

    register_event_listeners(|registry| {
        registry.listen(LoggingListener::new());
        registry.listen(TracingListener);
    });

    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(
        config.session.session_lifetime,
    ));
    let governor = RateGovernor::new(
        Arc::new(InMemoryStore::with_capacity(config.rate_limit.max_buckets)),
        config.rate_limit.limit(),
    );

    let sweeper = SweepExpiredAction::new(Arc::clone(&sessions), governor.clone())
        .spawn(config.sweep.interval_std());

    let state = AppState::new(
        user_repo,
        ledger,
        sessions,
        governor,
        config.session.clone(),
    );

    let mut router = app(state);
    if let Some(origin) = &config.allowed_origin {
        router = router.layer(cors_for_origin(origin));
    }

    let listener = TcpListener::bind(addr).await?;
    log::info!(
        target: "chorepool",
        "msg=\"server listening\", addr=\"{addr}\", database=\"{database_url}\""
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    log::info!(target: "chorepool", "msg=\"server stopped\"");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!(target: "chorepool", "msg=\"failed to listen for shutdown\", error=\"{e}\"");
    }
}
