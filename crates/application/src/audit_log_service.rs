use std::sync::Arc;

use triggermesh_core::AppResult;
use triggermesh_domain::{AuditLogEntry, AuditLogQuery};

use crate::AuditLogRepository;


/// Read-side access to the audit ledger.
#[derive(Clone)]
pub struct AuditLogService {
    repository: Arc<dyn AuditLogRepository>,
}

impl AuditLogService {
    /// Creates a new audit log service.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditLogRepository>) -> Self {
        Self { repository }
    }

    /// Lists one page of entries, most recent first.
    pub async fn list_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        self.repository.list_entries(query).await
    }

    /// Reports whether the ledger store is reachable.
    pub async fn health_check(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
