use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;
use triggermesh_core::AppError;

use crate::middleware::RequestId;

mod types;

pub use types::ErrorResponse;

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    request_id: Option<String>,
}

impl ApiError {
    /// Attaches the correlation id echoed in the error body. Blank ids are ignored.
    #[must_use]
    pub fn with_request_id(mut self, request_id: &RequestId) -> Self {
        if !request_id.as_str().is_empty() {
            self.request_id = Some(request_id.as_str().to_owned());
        }
        self
    }

    fn public_message(&self) -> String {
        match &self.error {
            AppError::Validation(message)
            | AppError::NotFound(message)
            | AppError::Unauthorized(message)
            | AppError::PayloadTooLarge(message) => message.clone(),
            AppError::Upstream(upstream) => upstream.to_string(),
            AppError::Internal(detail) => {
                error!(
                    request_id = self.request_id.as_deref().unwrap_or_default(),
                    detail = detail.as_str(),
                    "internal error"
                );
                "internal server error".to_owned()
            }
        }
    }
}

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self {
            error: value,
            request_id: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = self.public_message();

        let payload = Json(ErrorResponse::new(
            message,
            status.canonical_reason().unwrap_or("Unknown"),
            self.request_id,
        ));

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
