use axum::Json;
use axum::extract::Extension;
use axum::http::Uri;
use triggermesh_core::AppError;

use crate::dto::RootResponse;
use crate::error::ApiError;
use crate::middleware::RequestId;

const ENDPOINTS: [&str; 4] = [
    "/health - Health check",
    "/api/v1/trigger/jenkins - Trigger Jenkins build",
    "/api/v1/status/jenkins?build_id=<job>/<number> - Get Jenkins build status",
    "/api/v1/audit - Get audit logs",
];

pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "TriggerMesh API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: ENDPOINTS.to_vec(),
    })
}

pub async fn not_found_handler(
    Extension(request_id): Extension<RequestId>,
    uri: Uri,
) -> ApiError {
    ApiError::from(AppError::NotFound(format!("no route for {}", uri.path())))
        .with_request_id(&request_id)
}
