//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod jenkins_client;
mod jenkins_trigger;
mod sqlite_audit_log_repository;

pub use jenkins_client::{CsrfCrumb, DispatchedBuild, JenkinsClient};
pub use jenkins_trigger::JenkinsTrigger;
pub use sqlite_audit_log_repository::{AUDIT_TIMESTAMP_FORMAT, SqliteAuditLogRepository};
