//! Ports for the external collaborators of the submission engine.

mod audit;
mod schema;
mod transport;
mod ui;

pub use audit::{SubmissionAuditAction, SubmissionAuditEvent, SubmissionAuditLog};
pub use schema::{SchemaIssue, SchemaOutcome, SchemaValidator};
pub use transport::{AttachmentPayload, SubmissionTransport, TransportOutcome};
pub use ui::{FocusHandler, PreviewReleaser};
