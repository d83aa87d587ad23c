use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ORIGIN,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::middleware::RequestId;
use crate::state::AppState;

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Origin allow-list for cross-origin browser callers.
///
/// An empty list allows every origin.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

/// Outcome of checking one request's `Origin` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginDecision {
    /// No allow-list configured.
    AnyOrigin,
    /// Origin matched an allow-list entry and is echoed back.
    Allowed(String),
    /// No `Origin` header was sent.
    SameOrigin,
    /// Origin is not an `http://` or `https://` URL.
    Malformed,
    /// Origin is well formed but not on the allow-list.
    NotAllowed,
}

impl CorsPolicy {
    /// Creates a policy from configured origins.
    #[must_use]
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    /// Decides the `Access-Control-Allow-Origin` outcome for an `Origin` value.
    #[must_use]
    pub fn decide(&self, origin: Option<&str>) -> OriginDecision {
        if self.allowed_origins.is_empty() {
            return OriginDecision::AnyOrigin;
        }

        let Some(origin) = origin.filter(|value| !value.is_empty()) else {
            return OriginDecision::SameOrigin;
        };

        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            return OriginDecision::Malformed;
        }

        if self
            .allowed_origins
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(origin))
        {
            OriginDecision::Allowed(origin.to_owned())
        } else {
            OriginDecision::NotAllowed
        }
    }
}

impl OriginDecision {
    fn apply(&self, headers: &mut HeaderMap) {
        match self {
            Self::AnyOrigin => {
                headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            }
            Self::Allowed(origin) => {
                if let Ok(value) = HeaderValue::from_str(origin.as_str()) {
                    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
                }
            }
            Self::SameOrigin | Self::Malformed | Self::NotAllowed => {}
        }

        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
    }
}

/// Sets CORS headers on every response and answers preflight `OPTIONS` requests.
///
/// A rejected origin never blocks the request itself; it only withholds the header.
pub(super) async fn apply_cors(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(ORIGIN)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
    let decision = state.cors_policy.decide(origin.as_deref());

    if matches!(
        decision,
        OriginDecision::Malformed | OriginDecision::NotAllowed
    ) {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .map(|request_id| request_id.as_str().to_owned())
            .unwrap_or_default();
        let reason = if decision == OriginDecision::Malformed {
            "invalid origin format"
        } else {
            "origin not allowed"
        };
        warn!(
            request_id = request_id.as_str(),
            origin = origin.as_deref().unwrap_or_default(),
            "{reason}"
        );
    }

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    decision.apply(response.headers_mut());
    response
}
