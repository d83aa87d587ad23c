use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;
use triggermesh_core::AppError;

use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestId;
use crate::state::AppState;

/// API key the caller authenticated with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedApiKey(String);

impl AuthenticatedApiKey {
    /// Returns the matched key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Rejects requests whose `Authorization` header does not carry a configured key.
pub async fn require_api_key(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .cloned()
        .unwrap_or_else(|| RequestId::new(""));

    let matched = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| state.api_keys.authenticate(value))
        .map(str::to_owned);

    let Some(api_key) = matched else {
        warn!(
            request_id = request_id.as_str(),
            path = request.uri().path(),
            "invalid API key"
        );
        return Err(
            ApiError::from(AppError::Unauthorized("Unauthorized".to_owned()))
                .with_request_id(&request_id),
        );
    };

    request
        .extensions_mut()
        .insert(AuthenticatedApiKey(api_key));
    Ok(next.run(request).await)
}
