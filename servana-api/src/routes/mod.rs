//! API route definitions

mod health;
mod items;
mod realms;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use servana_core::{ErrorCategory, ServanaError};
use tracing::error;

use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(items::routes())
        .merge(realms::routes())
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub category: ErrorCategory,
}

/// A service error on its way out of a handler
#[derive(Debug)]
pub struct ApiError(pub ServanaError);

impl From<ServanaError> for ApiError {
    fn from(e: ServanaError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.category() {
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCategory::Configuration => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCategory::Transient => StatusCode::GATEWAY_TIMEOUT,
            ErrorCategory::Remote => StatusCode::BAD_GATEWAY,
            ErrorCategory::Storage | ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let body = ErrorResponse {
            error: self.0.to_string(),
            category: self.0.category(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;
