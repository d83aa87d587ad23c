use serde::Serialize;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

impl ErrorResponse {
    pub(super) fn new(error: String, status: &'static str, request_id: Option<String>) -> Self {
        Self {
            error,
            status,
            request_id,
        }
    }
}
