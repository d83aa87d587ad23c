use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use tracing::{error, info};

/// Header carrying the request correlation id in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id attached to every inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Wraps an existing id.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Reuses a caller supplied `X-Request-ID` or generates one, then echoes it on the response.
pub async fn assign_request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(generate_request_id, str::to_owned);

    info!(
        request_id = request_id.as_str(),
        method = %request.method(),
        path = request.uri().path(),
        "request received"
    );

    request
        .extensions_mut()
        .insert(RequestId::new(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    response
}

fn generate_request_id() -> String {
    let mut bytes = [0_u8; 16];
    match getrandom::fill(&mut bytes) {
        Ok(()) => hex::encode(bytes),
        Err(error) => {
            error!(%error, "secure random source failed, using fallback request id");
            fallback_request_id()
        }
    }
}

fn fallback_request_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let process_id = std::process::id();
    let seed = u64::try_from(nanos % u128::from(u64::MAX)).unwrap_or_default()
        ^ u64::from(process_id);
    let mut rng = SmallRng::seed_from_u64(seed);

    format!("req-{nanos}-{process_id}-{}", rng.next_u64())
}
