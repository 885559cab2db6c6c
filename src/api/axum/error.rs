use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::api::ErrorResponse;
use crate::ChoreError;

/// converts `ChoreError` into JSON HTTP responses
#[derive(Debug)]
pub struct AppError(pub ChoreError);

impl From<ChoreError> for AppError {
    fn from(err: ChoreError) -> Self {
        Self(err)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ChoreError::Validation(_)
            | ChoreError::AlreadyCompleted
            | ChoreError::NotCompleted
            | ChoreError::InsufficientPoints { .. } => StatusCode::BAD_REQUEST,
            ChoreError::UsernameTaken | ChoreError::CodeTaken | ChoreError::AlreadyInGroup => {
                StatusCode::CONFLICT
            }
            ChoreError::InvalidCredentials | ChoreError::UserNotFound => StatusCode::UNAUTHORIZED,
            // an unauthenticated caller sees the same thing as for an unknown route
            ChoreError::SessionInvalid | ChoreError::TaskNotFound | ChoreError::GroupNotFound => {
                StatusCode::NOT_FOUND
            }
            ChoreError::Forbidden(_) | ChoreError::NoGroup => StatusCode::FORBIDDEN,
            ChoreError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ChoreError::PasswordHashError
            | ChoreError::DatabaseError(_)
            | ChoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, Json(ErrorResponse::from(&self.0))).into_response();

        if let ChoreError::RateLimited { retry_after } = self.0 {
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

/// `Json` extractor whose rejections use the JSON error body.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError(ChoreError::Validation(invalid_json(&rejection)))),
        }
    }
}

fn invalid_json(rejection: &JsonRejection) -> String {
    format!("Invalid JSON: {}", rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ChoreError::AlreadyCompleted, StatusCode::BAD_REQUEST),
            (
                ChoreError::InsufficientPoints {
                    available: 0,
                    required: 1,
                },
                StatusCode::BAD_REQUEST,
            ),
            (ChoreError::UsernameTaken, StatusCode::CONFLICT),
            (ChoreError::AlreadyInGroup, StatusCode::CONFLICT),
            (ChoreError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ChoreError::SessionInvalid, StatusCode::NOT_FOUND),
            (ChoreError::NoGroup, StatusCode::FORBIDDEN),
            (ChoreError::TaskNotFound, StatusCode::NOT_FOUND),
            (
                ChoreError::RateLimited { retry_after: 1 },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (ChoreError::PasswordHashError, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(AppError(err).status(), status);
        }
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError(ChoreError::RateLimited { retry_after: 30 }).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "30");
    }
}
