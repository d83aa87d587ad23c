use async_trait::async_trait;

use triggermesh_core::AppResult;
use triggermesh_domain::{AuditLogEntry, AuditLogQuery, NewAuditLogEntry};

/// Repository port for the append-only audit ledger.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Appends one entry. Existing entries are never rewritten.
    async fn append_entry(&self, entry: NewAuditLogEntry) -> AppResult<()>;

    /// Lists entries most recent first.
    async fn list_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>>;

    /// Verifies the backing store is reachable.
    async fn ping(&self) -> AppResult<()>;
}
