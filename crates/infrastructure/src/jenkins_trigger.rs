use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::warn;

use triggermesh_application::{BuildFailure, CiEngine};
use triggermesh_domain::{BuildId, BuildResult, BuildTriggerRequest};

use crate::JenkinsClient;


#[derive(Debug, Deserialize)]
struct JenkinsBuildInfo {
    #[serde(default)]
    url: String,
}

/// Jenkins implementation of the CI engine port.
#[derive(Clone)]
pub struct JenkinsTrigger {
    client: JenkinsClient,
}

impl JenkinsTrigger {
    /// Creates a trigger backed by the provided client.
    #[must_use]
    pub fn new(client: JenkinsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CiEngine for JenkinsTrigger {
    async fn trigger_build(
        &self,
        request: &BuildTriggerRequest,
    ) -> Result<BuildResult, BuildFailure> {
        let job_segment = urlencoding::encode(request.job_name().as_str());
        let parameters = request.parameters();

        let (path, form) = if parameters.is_empty() {
            (
                format!("/job/{job_segment}/build"),
                BTreeMap::from([("json".to_owned(), "{}".to_owned())]),
            )
        } else {
            (
                format!("/job/{job_segment}/buildWithParameters"),
                parameters.as_map().clone(),
            )
        };

        let build = self
            .client
            .dispatch_build(path.as_str(), &form)
            .await
            .map_err(|error| BuildFailure::new("Failed to trigger build", error))?;

        Ok(BuildResult::triggered(
            request.job_name(),
            build.build_id,
            build.build_url,
        ))
    }

    async fn build_status(&self, build_id: &BuildId) -> Result<BuildResult, BuildFailure> {
        let raw_job = build_id.job_name();
        let job_name = urlencoding::decode(raw_job)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| raw_job.to_owned());
        let job_segment = urlencoding::encode(job_name.as_str());
        let number_segment = urlencoding::encode(build_id.build_number());
        let fallback_url = format!(
            "{}/job/{job_segment}/{number_segment}/",
            self.client.base_url()
        );

        let body = self
            .client
            .send_request(
                Method::GET,
                format!("/job/{job_segment}/{number_segment}/api/json").as_str(),
                None,
            )
            .await
            .map_err(|error| BuildFailure::new("Failed to get build status", error))?;

        let build_url = match serde_json::from_slice::<JenkinsBuildInfo>(&body) {
            Ok(info) if !info.url.is_empty() => info.url,
            Ok(_) => fallback_url,
            Err(error) => {
                warn!(%build_id, %error, "failed to parse build info, returning basic info");
                fallback_url
            }
        };

        Ok(BuildResult::status(build_id, build_url))
    }
}
