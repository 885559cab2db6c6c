//! Request admission: rate limiting for every route, session resolution for
//! protected ones.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::error::AppError;
use super::routes::AppState;
use crate::actions::ValidateSessionAction;
use crate::api::ErrorResponse;
use crate::rate_limit::{extract_client_ip, RateGovernor, RateLimitResult};
use crate::session::token_from_cookie_header;
use crate::ChoreError;

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// The caller resolved by [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub username: String,
    pub token: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError(ChoreError::SessionInvalid))
    }
}

/// Rate limiting identity of a request: forwarded address, then peer address.
pub fn client_identity(req: &Request) -> String {
    let forwarded = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok());
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    extract_client_ip(forwarded, peer)
}

pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookies| token_from_cookie_header(cookies, cookie_name))
        .map(ToOwned::to_owned)
}

pub async fn throttle(State(governor): State<RateGovernor>, req: Request, next: Next) -> Response {
    let identity = client_identity(&req);

    match governor.allow(&identity).await {
        Ok(RateLimitResult::Allowed { remaining }) => {
            let mut response = next.run(req).await;
            response.headers_mut().insert(
                HeaderName::from_static(RATE_LIMIT_REMAINING),
                HeaderValue::from(remaining),
            );
            response
        }
        Ok(RateLimitResult::Limited { retry_after }) => {
            log::warn!(
                target: "chorepool",
                "msg=\"rate limited\", client=\"{identity}\", retry_after={retry_after}"
            );
            AppError(ChoreError::RateLimited { retry_after }).into_response()
        }
        Err(err) => {
            log::error!(
                target: "chorepool",
                "msg=\"rate limit store error\", client=\"{identity}\", error=\"{err}\""
            );
            AppError(err).into_response()
        }
    }
}

/// Resolves the `session_token` cookie and attaches a [`CurrentUser`].
///
/// A missing, unknown or expired session gets the same 404 as an unknown route.
pub async fn require_session<U, L>(
    State(state): State<AppState<U, L>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError>
where
    U: Clone + Send + Sync + 'static,
    L: Clone + Send + Sync + 'static,
{
    let token = session_token(req.headers(), &state.session_config.cookie_name)
        .ok_or(AppError(ChoreError::SessionInvalid))?;

    let username = ValidateSessionAction::new(state.sessions.clone())
        .execute(&token)
        .await?;

    req.extensions_mut().insert(CurrentUser { username, token });
    Ok(next.run(req).await)
}

/// Drops the `Allow` header the method router adds to a 404, so a rejected
/// session on a known path carries the same headers as an unknown route.
pub async fn conceal_methods(mut response: Response) -> Response {
    if response.status() == StatusCode::NOT_FOUND {
        response.headers_mut().remove(header::ALLOW);
    }
    response
}

pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "not found".to_owned(),
            code: "NOT_FOUND".to_owned(),
        }),
    )
        .into_response()
}
