//! Shared primitives for all Rust crates in TriggerMesh.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use std::fmt::{Display, Formatter};

use thiserror::Error;

pub use auth::ApiKeyAllowList;

/// Result type used across TriggerMesh crates.
pub type AppResult<T> = Result<T, AppError>;

/// Sanitized failure categories for calls to a downstream CI engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// The engine rejected our credentials (401).
    Unauthorized,
    /// The engine accepted our credentials but denied the action (403).
    Forbidden,
    /// The job or build does not exist (404).
    NotFound,
    /// The engine rejected the request shape (400).
    BadRequest,
    /// The engine answered with a 5xx status.
    Unavailable,
    /// Any other non-2xx status.
    Failed,
    /// No usable response: connect failure, timeout, cancellation or unreadable body.
    Unreachable,
}

impl UpstreamErrorKind {
    /// Maps a non-2xx HTTP status code to its category.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            500..=599 => Self::Unavailable,
            _ => Self::Failed,
        }
    }

    /// Returns the caller-facing message for the category.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Unauthorized => "authentication failed: invalid credentials",
            Self::Forbidden => "access denied: insufficient permissions",
            Self::NotFound => "resource not found",
            Self::BadRequest => "invalid request",
            Self::Unavailable => "jenkins server error: please try again later",
            Self::Failed => "jenkins api request failed",
            Self::Unreachable => "jenkins server unreachable",
        }
    }
}

/// Downstream engine failure with a sanitized public message.
///
/// `Display` only ever renders the category message. The raw detail (status line,
/// transport error) is kept for internal logs and the audit ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamError {
    kind: UpstreamErrorKind,
    detail: String,
}

impl UpstreamError {
    /// Creates an upstream error from a category and internal detail.
    #[must_use]
    pub fn new(kind: UpstreamErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Creates an upstream error for a non-2xx HTTP status.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        Self::new(
            UpstreamErrorKind::from_status(status),
            format!("upstream responded with status {status}"),
        )
    }

    /// Returns the failure category.
    #[must_use]
    pub fn kind(&self) -> UpstreamErrorKind {
        self.kind
    }

    /// Returns internal detail that must not reach API callers.
    #[must_use]
    pub fn detail(&self) -> &str {
        self.detail.as_str()
    }
}

impl Display for UpstreamError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.kind.message())
    }
}

impl std::error::Error for UpstreamError {}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Request body exceeded the configured ceiling.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Downstream CI engine failed or could not be reached.
    #[error("{0}")]
    Upstream(UpstreamError),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code callers receive for this error.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::PayloadTooLarge(_) => 413,
            Self::Upstream(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the message kept for forensics, including upstream detail.
    #[must_use]
    pub fn detailed_message(&self) -> String {
        match self {
            Self::Upstream(error) => format!("{error} ({})", error.detail()),
            other => other.to_string(),
        }
    }
}

impl From<UpstreamError> for AppError {
    fn from(value: UpstreamError) -> Self {
        Self::Upstream(value)
    }
}
