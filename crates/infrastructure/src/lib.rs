//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_focus_handler;
mod http_submission_transport;
mod noop_preview_releaser;
mod rule_set_schema_validator;
mod tracing_submission_audit_log;

pub use console_focus_handler::ConsoleFocusHandler;
pub use http_submission_transport::HttpSubmissionTransport;
pub use noop_preview_releaser::NoopPreviewReleaser;
pub use rule_set_schema_validator::{RuleSetSchemaValidator, SchemaConstraint, SchemaRule};
pub use tracing_submission_audit_log::TracingSubmissionAuditLog;
