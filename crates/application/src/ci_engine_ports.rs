use async_trait::async_trait;

use triggermesh_core::AppError;
use triggermesh_domain::{BuildId, BuildResult, BuildTriggerRequest};

/// Failed engine call carrying both the caller-facing result and the cause.
#[derive(Debug)]
pub struct BuildFailure {
    /// Result body returned to the caller, always with `success = false`.
    pub result: BuildResult,
    /// Underlying failure, used for status mapping and the audit ledger.
    pub error: AppError,
}

impl BuildFailure {
    /// Wraps an error with a failed result whose message is `"{prefix}: {error}"`.
    #[must_use]
    pub fn new(prefix: &str, error: AppError) -> Self {
        Self {
            result: BuildResult::failed(format!("{prefix}: {error}")),
            error,
        }
    }
}

/// Port for CI engines that can start builds and report on them.
#[async_trait]
pub trait CiEngine: Send + Sync {
    /// Starts one build for a validated request.
    async fn trigger_build(
        &self,
        request: &BuildTriggerRequest,
    ) -> Result<BuildResult, BuildFailure>;

    /// Looks up an existing build.
    async fn build_status(&self, build_id: &BuildId) -> Result<BuildResult, BuildFailure>;
}
