use std::sync::Arc;

use sqlx::SqlitePool;
use triggermesh_application::{AuditLogService, BuildTriggerService};
use triggermesh_core::{ApiKeyAllowList, AppError};
use triggermesh_infrastructure::{JenkinsClient, JenkinsTrigger, SqliteAuditLogRepository};

use crate::api_config::ApiConfig;
use crate::api_router::CorsPolicy;
use crate::state::AppState;

pub fn build_app_state(pool: SqlitePool, config: &ApiConfig) -> Result<AppState, AppError> {
    let http_client = reqwest::Client::builder()
        .timeout(config.jenkins.timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build http client: {error}")))?;

    let jenkins_client = JenkinsClient::new(
        http_client,
        config.jenkins.url.as_str(),
        config.jenkins.username.as_str(),
        config.jenkins.token.as_str(),
    );
    let audit_repository = Arc::new(SqliteAuditLogRepository::new(pool));

    Ok(AppState {
        build_trigger_service: BuildTriggerService::new(
            Arc::new(JenkinsTrigger::new(jenkins_client)),
            audit_repository.clone(),
        ),
        audit_log_service: AuditLogService::new(audit_repository),
        api_keys: Arc::new(ApiKeyAllowList::new(config.api_keys.iter().cloned())),
        cors_policy: Arc::new(CorsPolicy::new(config.server.allowed_origins.clone())),
        max_body_size: config.server.max_body_size,
    })
}
