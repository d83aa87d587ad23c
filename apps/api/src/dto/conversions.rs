use triggermesh_domain::{AuditLogEntry, BuildResult};

use super::types::{AuditLogEntryResponse, BuildResultResponse};

impl From<BuildResult> for BuildResultResponse {
    fn from(result: BuildResult) -> Self {
        Self {
            success: result.success,
            build_id: result.build_id.filter(|value| !value.is_empty()),
            build_url: result.build_url.filter(|value| !value.is_empty()),
            message: result.message,
        }
    }
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            id: entry.id,
            timestamp: entry.timestamp,
            api_key: entry.api_key_used,
            method: entry.http_method,
            path: entry.request_path,
            status: entry.http_status,
            job_name: entry.job_name,
            params: entry.parameters_json,
            result: entry.result.as_str().to_owned(),
            error: entry.error_text.filter(|value| !value.is_empty()),
        }
    }
}
