mod cors;
mod error;
mod handlers;
mod middleware;
mod routes;

pub use cors::{for_origin as cors_for_origin, permissive as permissive_cors};
pub use error::{AppError, JsonBody};
pub use middleware::{
    client_identity, conceal_methods, not_found, require_session, session_token, throttle,
    CurrentUser,
};
pub use routes::{api_routes, app, private_routes, public_routes, AppState, API_PREFIX};
