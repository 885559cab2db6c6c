//! CORS configuration for Axum using tower-http.

use axum::http::{header, Method};
use tower_http::cors::CorsLayer;

/// Creates a permissive CORS configuration that allows all origins.
///
/// **Warning**: This is intended for development only. Do not use in production.
pub fn permissive() -> CorsLayer {
    CorsLayer::permissive()
}

/// Credentialed CORS for a browser front end served from `allowed_origin`.
///
/// The session travels in a cookie, so credentials must be allowed and the
/// origin must be explicit. An origin that does not parse allows nothing.
pub fn for_origin(allowed_origin: &str) -> CorsLayer {
    let origins: Vec<_> = allowed_origin
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
