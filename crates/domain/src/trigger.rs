//! Build trigger value types and input validation rules.
//!
//! Every check here runs before any request is sent to a CI engine, so a value
//! of [`BuildTriggerRequest`] or [`BuildId`] is always safe to dispatch.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use triggermesh_core::{AppError, AppResult};

/// Maximum job name length in characters.
pub const JOB_NAME_MAX_LENGTH: usize = 255;

/// Maximum number of build parameters per trigger.
pub const MAX_BUILD_PARAMETERS: usize = 100;

/// Maximum parameter key length in characters.
pub const PARAMETER_KEY_MAX_LENGTH: usize = 255;

/// Maximum parameter value size in bytes (10 KB).
pub const PARAMETER_VALUE_MAX_BYTES: usize = 10 * 1024;

/// Validated CI job name.
///
/// Letters, digits, underscore, hyphen, space and `/` (folder-qualified jobs
/// such as `team/service`) are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobName(String);

impl JobName {
    /// Creates a validated job name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();

        if value.is_empty() {
            return Err(AppError::Validation("Job name is required".to_owned()));
        }

        if value.chars().count() > JOB_NAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "Job name exceeds maximum length of {JOB_NAME_MAX_LENGTH} characters"
            )));
        }

        if !value.chars().all(is_job_name_char) {
            return Err(AppError::Validation(
                "Invalid job name format: only alphanumeric characters, underscores, hyphens, slashes, and spaces are allowed"
                    .to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the job name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for JobName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

fn is_job_name_char(character: char) -> bool {
    character.is_ascii_alphanumeric() || matches!(character, '_' | '-' | '/' | ' ')
}

/// Validated build parameter map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildParameters(BTreeMap<String, String>);

impl BuildParameters {
    /// Creates a validated parameter map.
    ///
    /// Keys are dotted identifiers (`deploy.target-env`): segments of letters,
    /// digits, underscore or hyphen joined by single dots.
    pub fn new<I>(parameters: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let parameters: BTreeMap<String, String> = parameters.into_iter().collect();

        if parameters.len() > MAX_BUILD_PARAMETERS {
            return Err(AppError::Validation(format!(
                "Maximum {MAX_BUILD_PARAMETERS} parameters allowed"
            )));
        }

        for (key, value) in &parameters {
            validate_parameter_key(key)?;

            if value.len() > PARAMETER_VALUE_MAX_BYTES {
                return Err(AppError::Validation(format!(
                    "Parameter value for '{key}' exceeds maximum length of 10KB"
                )));
            }
        }

        Ok(Self(parameters))
    }

    /// Returns whether no parameters were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the parameters in key order.
    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

fn validate_parameter_key(key: &str) -> AppResult<()> {
    if key.is_empty() {
        return Err(AppError::Validation(
            "Parameter key cannot be empty".to_owned(),
        ));
    }

    if key.chars().count() > PARAMETER_KEY_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "Parameter key '{key}' exceeds maximum length of {PARAMETER_KEY_MAX_LENGTH} characters"
        )));
    }

    let is_dotted_identifier = key.split('.').all(|segment| {
        !segment.is_empty()
            && segment.chars().all(|character| {
                character.is_ascii_alphanumeric() || matches!(character, '_' | '-')
            })
    });

    if !is_dotted_identifier {
        return Err(AppError::Validation(format!(
            "Invalid parameter key format '{key}': only alphanumeric characters, underscores, hyphens, and dots (not leading/trailing/consecutive) are allowed"
        )));
    }

    Ok(())
}

/// Validated build trigger request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTriggerRequest {
    job_name: JobName,
    parameters: BuildParameters,
}

impl BuildTriggerRequest {
    /// Validates a raw job name and parameter map.
    pub fn new<I>(job_name: impl Into<String>, parameters: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(Self {
            job_name: JobName::new(job_name)?,
            parameters: BuildParameters::new(parameters)?,
        })
    }

    /// Returns the job name.
    #[must_use]
    pub fn job_name(&self) -> &JobName {
        &self.job_name
    }

    /// Returns the build parameters.
    #[must_use]
    pub fn parameters(&self) -> &BuildParameters {
        &self.parameters
    }
}

/// Identity of one build execution, serialized as `"<job>/<number>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildId {
    job_name: String,
    build_number: String,
}

impl BuildId {
    /// Parses a `job/number` build identifier.
    pub fn parse(value: &str) -> AppResult<Self> {
        if value.is_empty() {
            return Err(AppError::Validation("Build ID cannot be empty".to_owned()));
        }

        let mut segments = value.split('/');
        let (Some(job_name), Some(build_number), None) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(AppError::Validation(
                "Invalid build ID format. Expected: jobName/buildNumber".to_owned(),
            ));
        };

        if job_name.is_empty() {
            return Err(AppError::Validation(
                "Job name in build ID cannot be empty".to_owned(),
            ));
        }

        if build_number.is_empty() {
            return Err(AppError::Validation(
                "Build number cannot be empty".to_owned(),
            ));
        }

        Ok(Self {
            job_name: job_name.to_owned(),
            build_number: build_number.to_owned(),
        })
    }

    /// Returns the job segment.
    #[must_use]
    pub fn job_name(&self) -> &str {
        self.job_name.as_str()
    }

    /// Returns the build number segment.
    #[must_use]
    pub fn build_number(&self) -> &str {
        self.build_number.as_str()
    }
}

impl Display for BuildId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}/{}", self.job_name, self.build_number)
    }
}

/// Outcome of a trigger or status call against a CI engine.
///
/// A successful result without `build_id` means the engine accepted the
/// request but did not confirm which build it started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
    /// Whether the engine accepted the call.
    pub success: bool,
    /// Build identity in `job/number` form, when known.
    pub build_id: Option<String>,
    /// Canonical build or job URL, when known.
    pub build_url: Option<String>,
    /// Human readable summary.
    pub message: String,
}

impl BuildResult {
    /// Result for an accepted trigger.
    #[must_use]
    pub fn triggered(
        job_name: &JobName,
        build_id: Option<String>,
        build_url: Option<String>,
    ) -> Self {
        Self {
            success: true,
            build_id,
            build_url,
            message: format!("Successfully triggered build for job {job_name}"),
        }
    }

    /// Result for a resolved status lookup.
    #[must_use]
    pub fn status(build_id: &BuildId, build_url: String) -> Self {
        Self {
            success: true,
            build_id: Some(build_id.to_string()),
            build_url: Some(build_url),
            message: format!("Retrieved build status for {build_id}"),
        }
    }

    /// Failed result carrying a caller-facing message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            build_id: None,
            build_url: None,
            message: message.into(),
        }
    }
}
