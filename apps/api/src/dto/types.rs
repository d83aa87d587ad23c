use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

/// Service banner listing the public endpoints.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

/// Incoming payload for triggering a Jenkins build.
#[derive(Debug, Default, Deserialize)]
pub struct TriggerBuildRequest {
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub parameters: Option<BTreeMap<String, String>>,
}

/// API representation of a trigger or status outcome.
#[derive(Debug, Serialize)]
pub struct BuildResultResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_url: Option<String>,
    pub message: String,
}

/// API representation of one audit ledger row.
#[derive(Debug, Serialize)]
pub struct AuditLogEntryResponse {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub api_key: String,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub job_name: String,
    pub params: String,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
