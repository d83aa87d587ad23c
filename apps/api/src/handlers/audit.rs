use axum::Json;
use axum::extract::{Extension, Query, State};
use tracing::error;
use triggermesh_domain::AuditLogQuery;

use crate::dto::AuditLogEntryResponse;
use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestId;
use crate::state::AppState;

/// Raw pagination parameters. Unparsable values fall back to defaults.
#[derive(Debug, serde::Deserialize)]
pub struct AuditLogListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<AuditLogListQuery>,
) -> ApiResult<Json<Vec<AuditLogEntryResponse>>> {
    let query = AuditLogQuery::new(
        parse_number(query.limit.as_deref()),
        parse_number(query.offset.as_deref()),
    );

    let entries = state
        .audit_log_service
        .list_entries(query)
        .await
        .map_err(|list_error| {
            error!(
                request_id = request_id.as_str(),
                error = %list_error,
                "failed to list audit entries"
            );
            ApiError::from(list_error).with_request_id(&request_id)
        })?
        .into_iter()
        .map(AuditLogEntryResponse::from)
        .collect();

    Ok(Json(entries))
}

fn parse_number(value: Option<&str>) -> Option<i64> {
    value.and_then(|value| value.trim().parse::<i64>().ok())
}
