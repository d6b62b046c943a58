//! JSON API handlers.

pub mod ai;

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::ai::AiError;
use crate::db::RepositoryError;
use crate::error::AppError;

/// Error for API requests: `{"error": "..."}` with the status [`AppError`] maps to.
#[derive(Debug)]
pub struct ApiError(pub AppError);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<AiError> for ApiError {
    fn from(err: AiError) -> Self {
        Self(err.into())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.0.report();
        let body = ErrorBody {
            error: self.0.user_message(),
        };
        (self.0.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::{StatusCode, header};

    use super::*;

    #[test]
    fn test_api_error_status_and_content_type() {
        let response = ApiError::from(AiError::LimitReached(Duration::from_secs(12))).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/json")
        );

        let response = ApiError::from(AiError::Disabled).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = ApiError::from(RepositoryError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
