use axum::Json;
use axum::body::{Body, to_bytes};
use axum::extract::{Extension, Query, State};
use axum::http::{Method, StatusCode, Uri};
use tracing::{error, warn};
use triggermesh_application::{BuildFailure, TriggerContext};
use triggermesh_core::AppError;
use triggermesh_domain::{BuildId, BuildResult, BuildTriggerRequest};

use crate::dto::{BuildResultResponse, TriggerBuildRequest};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{AuthenticatedApiKey, RequestId, is_length_limit_error};
use crate::state::AppState;

#[derive(Debug, serde::Deserialize)]
pub struct BuildStatusQuery {
    pub build_id: Option<String>,
}

pub async fn trigger_jenkins_build_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(api_key): Extension<AuthenticatedApiKey>,
    method: Method,
    uri: Uri,
    body: Body,
) -> ApiResult<(StatusCode, Json<BuildResultResponse>)> {
    let payload = read_trigger_payload(body, &request_id).await?;

    let request = BuildTriggerRequest::new(
        payload.job.unwrap_or_default(),
        payload.parameters.unwrap_or_default(),
    )
    .map_err(|validation_error| {
        warn!(
            request_id = request_id.as_str(),
            error = %validation_error,
            "rejected trigger request"
        );
        ApiError::from(validation_error).with_request_id(&request_id)
    })?;

    let context = TriggerContext {
        request_id: request_id.as_str().to_owned(),
        api_key: api_key.as_str().to_owned(),
        http_method: method.to_string(),
        request_path: uri.path().to_owned(),
    };

    let outcome = state
        .build_trigger_service
        .trigger_build(&context, &request)
        .await;

    Ok(build_response(outcome))
}

pub async fn jenkins_build_status_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<BuildStatusQuery>,
) -> ApiResult<(StatusCode, Json<BuildResultResponse>)> {
    let build_id = BuildId::parse(query.build_id.as_deref().unwrap_or_default())
        .map_err(|parse_error| ApiError::from(parse_error).with_request_id(&request_id))?;

    let outcome = state.build_trigger_service.build_status(&build_id).await;
    if let Err(failure) = &outcome {
        error!(
            request_id = request_id.as_str(),
            build_id = %build_id,
            error = %failure.error.detailed_message(),
            "build status lookup failed"
        );
    }

    Ok(build_response(outcome))
}

async fn read_trigger_payload(
    body: Body,
    request_id: &RequestId,
) -> ApiResult<TriggerBuildRequest> {
    let bytes = to_bytes(body, usize::MAX).await.map_err(|read_error| {
        let error = if is_length_limit_error(&read_error) {
            AppError::PayloadTooLarge("Request body too large".to_owned())
        } else {
            AppError::Validation("Invalid request body".to_owned())
        };
        warn!(
            request_id = request_id.as_str(),
            error = %read_error,
            "failed to read request body"
        );
        ApiError::from(error).with_request_id(request_id)
    })?;

    serde_json::from_slice::<TriggerBuildRequest>(&bytes).map_err(|parse_error| {
        warn!(
            request_id = request_id.as_str(),
            error = %parse_error,
            "failed to parse request body"
        );
        ApiError::from(AppError::Validation("Invalid request body".to_owned()))
            .with_request_id(request_id)
    })
}

fn build_response(
    outcome: Result<BuildResult, BuildFailure>,
) -> (StatusCode, Json<BuildResultResponse>) {
    match outcome {
        Ok(result) => (StatusCode::OK, Json(BuildResultResponse::from(result))),
        Err(failure) => (
            StatusCode::from_u16(failure.error.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(BuildResultResponse::from(failure.result)),
        ),
    }
}
