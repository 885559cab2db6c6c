use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::middleware::{from_fn_with_state, map_response};
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use super::handlers;
use super::middleware::{conceal_methods, not_found, require_session, throttle};
use crate::crypto::Argon2Hasher;
use crate::ledger::{GroupRepository, LedgerRepository};
use crate::rate_limit::RateGovernor;
use crate::session::{SessionConfig, SessionStore};
use crate::UserRepository;

/// Every route is mounted under this prefix by [`app`].
pub const API_PREFIX: &str = "/api/v1";

#[derive(Clone)]
pub struct AppState<U, L> {
    pub user_repo: U,
    pub ledger: L,
    pub sessions: Arc<dyn SessionStore>,
    pub governor: RateGovernor,
    pub session_config: SessionConfig,
    pub hasher: Argon2Hasher,
}

impl<U, L> AppState<U, L> {
    pub fn new(
        user_repo: U,
        ledger: L,
        sessions: Arc<dyn SessionStore>,
        governor: RateGovernor,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            user_repo,
            ledger,
            sessions,
            governor,
            session_config,
            hasher: Argon2Hasher::default(),
        }
    }

    #[must_use]
    pub fn with_hasher(mut self, hasher: Argon2Hasher) -> Self {
        self.hasher = hasher;
        self
    }
}

/// The full service: routes under [`API_PREFIX`], a JSON 404 fallback with no
/// `Allow` header, JSON content type on every response and rate limiting in
/// front of it all.
pub fn app<U, L>(state: AppState<U, L>) -> Router
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + GroupRepository + Clone + Send + Sync + 'static,
{
    let governor = state.governor.clone();

    Router::new()
        .nest(API_PREFIX, api_routes(state.clone()))
        .fallback(not_found)
        .layer(map_response(conceal_methods))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
        .layer(from_fn_with_state(governor, throttle))
        .with_state(state)
}

pub fn api_routes<U, L>(state: AppState<U, L>) -> Router<AppState<U, L>>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + GroupRepository + Clone + Send + Sync + 'static,
{
    Router::new()
        .merge(public_routes())
        .merge(private_routes(state))
}

pub fn public_routes<U, L>() -> Router<AppState<U, L>>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + GroupRepository + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/register", post(handlers::register::<U, L>))
        .route("/login", post(handlers::login::<U, L>))
}

/// Routes behind the session cookie.
pub fn private_routes<U, L>(state: AppState<U, L>) -> Router<AppState<U, L>>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + GroupRepository + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/logout", post(handlers::logout::<U, L>))
        .route("/validate", get(handlers::validate::<U, L>))
        .route(
            "/task",
            get(handlers::list_tasks::<U, L>)
                .post(handlers::create_task::<U, L>)
                .put(handlers::update_task::<U, L>)
                .delete(handlers::delete_task::<U, L>),
        )
        .route("/task/step", patch(handlers::step_task::<U, L>))
        .route(
            "/task/completion",
            patch(handlers::toggle_completion::<U, L>),
        )
        .route(
            "/group",
            get(handlers::get_group::<U, L>).post(handlers::create_group::<U, L>),
        )
        .route("/group/join", post(handlers::join_group::<U, L>))
        .route("/group/leave", post(handlers::leave_group::<U, L>))
        .route("/group/points", post(handlers::grant_points::<U, L>))
        .route_layer(from_fn_with_state(state, require_session::<U, L>))
}
