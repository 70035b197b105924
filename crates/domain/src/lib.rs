//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod attachment;
mod custom_rule;
mod field_registry;
mod issue;
mod submission;

pub use attachment::{Attachment, AttachmentSet, PreviewHandle};
pub use custom_rule::{CustomRule, CustomRuleReport};
pub use field_registry::FieldPathRegistry;
pub use issue::{IssueSource, ServerFieldErrors, ValidationIssue};
pub use submission::{FailureReason, SubmissionState, SubmissionStateMachine};
