//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_log_service;
mod audit_ports;
mod build_trigger_service;
mod ci_engine_ports;

pub use audit_log_service::AuditLogService;
pub use audit_ports::AuditLogRepository;
pub use build_trigger_service::{BuildTriggerService, TriggerContext};
pub use ci_engine_ports::{BuildFailure, CiEngine};
