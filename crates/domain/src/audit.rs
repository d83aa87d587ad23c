//! Audit ledger records.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use triggermesh_core::{AppError, AppResult};

/// Default page size for audit listings.
pub const DEFAULT_AUDIT_PAGE_SIZE: i64 = 100;

/// Largest page a single audit listing may return.
pub const MAX_AUDIT_PAGE_SIZE: i64 = 1_000;

/// Outcome recorded for one trigger attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditResult {
    /// The engine accepted the trigger.
    Success,
    /// The trigger failed.
    Failed,
}

impl AuditResult {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// Parses a stored value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(AppError::Internal(format!(
                "unknown audit result value '{value}'"
            ))),
        }
    }
}

impl Display for AuditResult {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Audit record about to be appended to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditLogEntry {
    /// Time the trigger attempt resolved.
    pub timestamp: DateTime<Utc>,
    /// API key the caller authenticated with.
    pub api_key_used: String,
    /// Inbound HTTP method.
    pub http_method: String,
    /// Inbound request path.
    pub request_path: String,
    /// HTTP status returned to the caller.
    pub http_status: u16,
    /// Job the caller asked to trigger.
    pub job_name: String,
    /// Trigger parameters serialized as a JSON object.
    pub parameters_json: String,
    /// Trigger outcome.
    pub result: AuditResult,
    /// Detailed failure text, only present for failures.
    pub error_text: Option<String>,
}

/// Persisted audit record.
///
/// `id` is assigned by the ledger and strictly increases with insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogEntry {
    /// Ledger-assigned identifier.
    pub id: i64,
    /// Time the trigger attempt resolved.
    pub timestamp: DateTime<Utc>,
    /// API key the caller authenticated with.
    pub api_key_used: String,
    /// Inbound HTTP method.
    pub http_method: String,
    /// Inbound request path.
    pub request_path: String,
    /// HTTP status returned to the caller.
    pub http_status: u16,
    /// Job the caller asked to trigger.
    pub job_name: String,
    /// Trigger parameters serialized as a JSON object.
    pub parameters_json: String,
    /// Trigger outcome.
    pub result: AuditResult,
    /// Detailed failure text, only present for failures.
    pub error_text: Option<String>,
}

/// Pagination window for audit listings, most recent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditLogQuery {
    limit: i64,
    offset: i64,
}

impl AuditLogQuery {
    /// Builds a query, replacing non-positive limits and negative offsets with defaults.
    #[must_use]
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = limit
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_AUDIT_PAGE_SIZE)
            .min(MAX_AUDIT_PAGE_SIZE);
        let offset = offset.filter(|value| *value >= 0).unwrap_or(0);

        Self { limit, offset }
    }

    /// Returns the page size.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Returns the number of rows skipped.
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.offset
    }
}

impl Default for AuditLogQuery {
    fn default() -> Self {
        Self::new(None, None)
    }
}
