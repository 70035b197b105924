//! Submission orchestration services and collaborator ports.

#![forbid(unsafe_code)]

mod focus_navigator;
mod issue_aggregator;
mod submission_ports;
mod submission_service;

pub use focus_navigator::FocusNavigator;
pub use issue_aggregator::IssueAggregator;
pub use submission_ports::{
    AttachmentPayload, FocusHandler, PreviewReleaser, SchemaIssue, SchemaOutcome, SchemaValidator,
    SubmissionAuditAction, SubmissionAuditEvent, SubmissionAuditLog, SubmissionTransport,
    TransportOutcome,
};
pub use submission_service::{SubmissionOutcome, SubmissionService};
