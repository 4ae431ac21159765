//! API error mapping onto the response envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use services::services::auth::AuthError;
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Auth(_) => StatusCode::BAD_GATEWAY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}
