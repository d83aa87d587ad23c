mod conversions;
mod types;

pub use types::{
    AuditLogEntryResponse, BuildResultResponse, HealthResponse, RootResponse, TriggerBuildRequest,
};
