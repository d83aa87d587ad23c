use std::sync::Arc;

use triggermesh_application::{AuditLogService, BuildTriggerService};
use triggermesh_core::ApiKeyAllowList;

use crate::api_router::CorsPolicy;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub build_trigger_service: BuildTriggerService,
    pub audit_log_service: AuditLogService,
    pub api_keys: Arc<ApiKeyAllowList>,
    pub cors_policy: Arc<CorsPolicy>,
    pub max_body_size: usize,
}
