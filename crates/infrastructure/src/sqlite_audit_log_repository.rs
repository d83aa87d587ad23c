use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::warn;

use triggermesh_application::AuditLogRepository;
use triggermesh_core::{AppError, AppResult};
use triggermesh_domain::{AuditLogEntry, AuditLogQuery, AuditResult, NewAuditLogEntry};

#[cfg(test)]
mod tests;

/// Storage format for ledger timestamps, always UTC.
pub const AUDIT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// SQLite-backed append-only audit ledger.
#[derive(Clone)]
pub struct SqliteAuditLogRepository {
    pool: SqlitePool,
}

impl SqliteAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    id: i64,
    timestamp: String,
    api_key: String,
    method: String,
    path: String,
    status: i64,
    job_name: String,
    params: String,
    result: String,
    error: Option<String>,
}

impl TryFrom<AuditLogRow> for AuditLogEntry {
    type Error = AppError;

    fn try_from(row: AuditLogRow) -> Result<Self, Self::Error> {
        let http_status = u16::try_from(row.status).map_err(|_| {
            AppError::Internal(format!(
                "audit entry {} has invalid status {}",
                row.id, row.status
            ))
        })?;

        Ok(Self {
            id: row.id,
            timestamp: parse_timestamp(row.id, row.timestamp.as_str()),
            api_key_used: row.api_key,
            http_method: row.method,
            request_path: row.path,
            http_status,
            job_name: row.job_name,
            parameters_json: row.params,
            result: AuditResult::parse(row.result.as_str())?,
            error_text: row.error,
        })
    }
}

/// Accepts timestamps with or without fractional seconds. Unreadable values are
/// replaced by the current time so one bad row cannot break a listing.
fn parse_timestamp(id: i64, value: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|parsed| parsed.with_timezone(&Utc)))
        .unwrap_or_else(|error| {
            warn!(id, value, %error, "unreadable audit timestamp, using current time");
            Utc::now()
        })
}

#[async_trait]
impl AuditLogRepository for SqliteAuditLogRepository {
    async fn append_entry(&self, entry: NewAuditLogEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                timestamp, api_key, method, path, status, job_name, params, result, error
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.timestamp.format(AUDIT_TIMESTAMP_FORMAT).to_string())
        .bind(entry.api_key_used)
        .bind(entry.http_method)
        .bind(entry.request_path)
        .bind(i64::from(entry.http_status))
        .bind(entry.job_name)
        .bind(entry.parameters_json)
        .bind(entry.result.as_str())
        .bind(entry.error_text)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit entry: {error}")))?;

        Ok(())
    }

    async fn list_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT id, timestamp, api_key, method, path, status, job_name, params, result, error
            FROM audit_logs
            ORDER BY id DESC
            LIMIT ?
            OFFSET ?
            "#,
        )
        .bind(query.limit())
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list audit log entries: {error}"))
        })?;

        rows.into_iter().map(AuditLogEntry::try_from).collect()
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("database ping failed: {error}")))?;

        Ok(())
    }
}
