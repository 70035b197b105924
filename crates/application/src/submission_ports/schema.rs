use async_trait::async_trait;
use formkern_core::{AppResult, FieldId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One field-scoped message produced by the declarative schema validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIssue {
    /// Field the message applies to.
    pub field: FieldId,
    /// User-facing message.
    pub message: String,
}

/// Result of one schema validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaOutcome {
    /// Every schema rule held.
    Valid,
    /// At least one rule failed; one message per failing field.
    Invalid(Vec<SchemaIssue>),
}

/// Declarative schema validator collaborator.
///
/// Expected validation failures are reported as [`SchemaOutcome::Invalid`],
/// never as an error; an `Err` return means a programmer error such as a
/// malformed rule set.
#[async_trait]
pub trait SchemaValidator: Send + Sync {
    /// Validates the form value tree against the declarative rules.
    async fn validate(&self, values: &Value) -> AppResult<SchemaOutcome>;
}
