use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use triggermesh_domain::{
    AuditResult, BuildId, BuildResult, BuildTriggerRequest, NewAuditLogEntry,
};

use crate::{AuditLogRepository, BuildFailure, CiEngine};


/// Request metadata recorded alongside each trigger attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerContext {
    /// Correlation identifier of the inbound request.
    pub request_id: String,
    /// API key the caller authenticated with.
    pub api_key: String,
    /// Inbound HTTP method.
    pub http_method: String,
    /// Inbound request path.
    pub request_path: String,
}

/// Triggers builds on a CI engine and records every attempt in the audit ledger.
#[derive(Clone)]
pub struct BuildTriggerService {
    engine: Arc<dyn CiEngine>,
    audit_repository: Arc<dyn AuditLogRepository>,
}

impl BuildTriggerService {
    /// Creates a new build trigger service.
    #[must_use]
    pub fn new(engine: Arc<dyn CiEngine>, audit_repository: Arc<dyn AuditLogRepository>) -> Self {
        Self {
            engine,
            audit_repository,
        }
    }

    /// Triggers one build and appends exactly one audit entry for the attempt.
    ///
    /// A ledger write failure is logged and does not change the returned outcome.
    pub async fn trigger_build(
        &self,
        context: &TriggerContext,
        request: &BuildTriggerRequest,
    ) -> Result<BuildResult, BuildFailure> {
        let outcome = self.engine.trigger_build(request).await;

        let (http_status, result, error_text) = match &outcome {
            Ok(build) => {
                info!(
                    request_id = %context.request_id,
                    job = %request.job_name(),
                    build_id = build.build_id.as_deref().unwrap_or(""),
                    "build triggered"
                );
                (200, AuditResult::Success, None)
            }
            Err(failure) => {
                error!(
                    request_id = %context.request_id,
                    job = %request.job_name(),
                    error = %failure.error.detailed_message(),
                    "build trigger failed"
                );
                (
                    failure.error.http_status(),
                    AuditResult::Failed,
                    Some(failure.error.detailed_message()),
                )
            }
        };

        let parameters_json = serde_json::to_string(request.parameters().as_map())
            .unwrap_or_else(|_| "{}".to_owned());

        let entry = NewAuditLogEntry {
            timestamp: Utc::now(),
            api_key_used: context.api_key.clone(),
            http_method: context.http_method.clone(),
            request_path: context.request_path.clone(),
            http_status,
            job_name: request.job_name().as_str().to_owned(),
            parameters_json,
            result,
            error_text,
        };

        if let Err(audit_error) = self.audit_repository.append_entry(entry).await {
            error!(
                request_id = %context.request_id,
                error = %audit_error,
                "failed to append audit entry"
            );
        }

        outcome
    }

    /// Looks up an existing build. Status lookups are not audited.
    pub async fn build_status(&self, build_id: &BuildId) -> Result<BuildResult, BuildFailure> {
        self.engine.build_status(build_id).await
    }
}
