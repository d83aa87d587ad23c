//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod trigger;

pub use audit::{
    AuditLogEntry, AuditLogQuery, AuditResult, DEFAULT_AUDIT_PAGE_SIZE, MAX_AUDIT_PAGE_SIZE,
    NewAuditLogEntry,
};
pub use trigger::{
    BuildId, BuildParameters, BuildResult, BuildTriggerRequest, JOB_NAME_MAX_LENGTH, JobName,
    MAX_BUILD_PARAMETERS, PARAMETER_KEY_MAX_LENGTH, PARAMETER_VALUE_MAX_BYTES,
};
