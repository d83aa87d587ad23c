use std::collections::BTreeMap;

use reqwest::header::{CONTENT_TYPE, HeaderMap, LOCATION};
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, warn};
use url::{Url, form_urlencoded};

use triggermesh_core::{AppError, AppResult, UpstreamError, UpstreamErrorKind};


const CRUMB_ISSUER_PATH: &str = "/crumbIssuer/api/json";
const DEFAULT_CRUMB_FIELD: &str = "Jenkins-Crumb";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// CSRF token issued by Jenkins for state-changing requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfCrumb {
    /// Form field and header name the token travels under.
    pub field: String,
    /// Token value.
    pub value: String,
}

/// Build identity recovered from a dispatch response.
///
/// `build_id` is `None` when Jenkins accepted the request without confirming the build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchedBuild {
    /// Build identity in `job/number` form.
    pub build_id: Option<String>,
    /// Canonical build URL, or the job root when only that is known.
    pub build_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrumbResponse {
    #[serde(default)]
    crumb: String,
    #[serde(rename = "crumbRequestField", default)]
    crumb_request_field: String,
}

/// Authenticated HTTP transport to one Jenkins controller.
#[derive(Clone)]
pub struct JenkinsClient {
    base_url: String,
    username: String,
    token: String,
    http_client: reqwest::Client,
}

impl JenkinsClient {
    /// Creates a client. A trailing slash on `base_url` is dropped.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: &str,
        username: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            username: username.into(),
            token: token.into(),
            http_client,
        }
    }

    /// Returns the normalized base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Sends one authenticated request and returns the response body on 2xx.
    pub async fn send_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> AppResult<Vec<u8>> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.authorized(method, url.as_str());
        if let Some(body) = body {
            request = request.json(body);
        }

        let (_, body) = self.execute(url.as_str(), request).await?;
        Ok(body)
    }

    /// Fetches a CSRF crumb. Callers treat any error as "no crumb".
    pub async fn fetch_crumb(&self) -> AppResult<CsrfCrumb> {
        let url = format!("{}{CRUMB_ISSUER_PATH}", self.base_url);
        let response = self
            .authorized(Method::GET, url.as_str())
            .send()
            .await
            .map_err(|error| unreachable_error(url.as_str(), &error))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(UpstreamError::from_status(status.as_u16()).into());
        }

        let crumb = response.json::<CrumbResponse>().await.map_err(|error| {
            AppError::Internal(format!("failed to decode crumb issuer response: {error}"))
        })?;

        if crumb.crumb.is_empty() {
            return Err(AppError::Internal(
                "crumb issuer returned an empty crumb".to_owned(),
            ));
        }

        let field = if crumb.crumb_request_field.is_empty() {
            DEFAULT_CRUMB_FIELD.to_owned()
        } else {
            crumb.crumb_request_field
        };

        Ok(CsrfCrumb {
            field,
            value: crumb.crumb,
        })
    }

    /// POSTs form-encoded fields to a build endpoint and reads the build identity
    /// from the `Location` header.
    pub async fn dispatch_build(
        &self,
        path: &str,
        form: &BTreeMap<String, String>,
    ) -> AppResult<DispatchedBuild> {
        let crumb = match self.fetch_crumb().await {
            Ok(crumb) => Some(crumb),
            Err(error) => {
                warn!(
                    error = %error.detailed_message(),
                    "failed to get CSRF crumb, proceeding without it"
                );
                None
            }
        };

        let form_body = {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            for (key, value) in form {
                serializer.append_pair(key, value);
            }
            if let Some(crumb) = &crumb {
                serializer.append_pair(crumb.field.as_str(), crumb.value.as_str());
            }
            serializer.finish()
        };

        let url = format!("{}{path}", self.base_url);
        let mut request = self
            .authorized(Method::POST, url.as_str())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(form_body);
        if let Some(crumb) = &crumb {
            request = request.header(crumb.field.as_str(), crumb.value.as_str());
        }

        let (headers, _) = self.execute(url.as_str(), request).await?;
        let location = headers.get(LOCATION).and_then(|value| value.to_str().ok());

        Ok(self.extract_build_info(location, path))
    }

    /// Derives build identity from a `Location` header value.
    ///
    /// Without a location only the job root URL is known. A location that does not
    /// look like `job/<name>/<number>/...` below the base path yields an empty identity.
    /// The build id carries decoded segments; the build URL keeps them encoded.
    #[must_use]
    pub fn extract_build_info(
        &self,
        location: Option<&str>,
        build_path: &str,
    ) -> DispatchedBuild {
        let Some(location) = location.filter(|value| !value.is_empty()) else {
            let job_segment = build_path
                .trim_start_matches("/job/")
                .split('/')
                .next()
                .unwrap_or_default();
            return DispatchedBuild {
                build_id: None,
                build_url: Some(format!("{}/job/{job_segment}/", self.base_url)),
            };
        };

        let Ok(base) = Url::parse(self.base_url.as_str()) else {
            return DispatchedBuild::default();
        };
        let Ok(resolved) = base.join(location) else {
            return DispatchedBuild::default();
        };

        let base_segments = non_empty_segments(&base);
        let segments = non_empty_segments(&resolved);
        let relative = segments
            .strip_prefix(base_segments.as_slice())
            .unwrap_or(segments.as_slice());

        match relative {
            ["job", job_name, build_number, ..] => DispatchedBuild {
                build_id: Some(format!(
                    "{}/{}",
                    decode_segment(job_name),
                    decode_segment(build_number)
                )),
                build_url: Some(format!(
                    "{}/job/{job_name}/{build_number}/",
                    self.base_url
                )),
            },
            _ => DispatchedBuild::default(),
        }
    }

    fn authorized(&self, method: Method, url: &str) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .basic_auth(self.username.as_str(), Some(self.token.as_str()))
    }

    async fn execute(
        &self,
        url: &str,
        request: RequestBuilder,
    ) -> AppResult<(HeaderMap, Vec<u8>)> {
        let response = request
            .send()
            .await
            .map_err(|error| unreachable_error(url, &error))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|error| unreachable_error(url, &error))?;

        if !status.is_success() {
            error!(
                %status,
                %url,
                body = %String::from_utf8_lossy(&body),
                "jenkins api request failed"
            );
            return Err(UpstreamError::from_status(status.as_u16()).into());
        }

        Ok((headers, body.to_vec()))
    }
}

fn non_empty_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|segment| !segment.is_empty()).collect())
        .unwrap_or_default()
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_owned())
}

fn unreachable_error(url: &str, error: &reqwest::Error) -> AppError {
    UpstreamError::new(
        UpstreamErrorKind::Unreachable,
        format!("request to {url} failed: {error}"),
    )
    .into()
}
