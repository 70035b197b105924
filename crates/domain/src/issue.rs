use std::collections::BTreeMap;
use std::str::FromStr;

use formkern_core::{AppError, AppResult, FieldId, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Origin of one field-scoped validation signal.
///
/// The variants carry a total precedence order: a server rejection is
/// authoritative and must not be overwritten by a stale client-side check,
/// and schema errors are structural and more specific than ad-hoc
/// predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSource {
    /// Runtime predicate not expressible in the declarative schema.
    Custom,
    /// Declarative schema rule.
    Schema,
    /// Field rejected by the remote system after submission.
    Server,
}

impl IssueSource {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Schema => "schema",
            Self::Server => "server",
        }
    }

    /// Returns the precedence rank; higher wins when sources disagree.
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            Self::Custom => 0,
            Self::Schema => 1,
            Self::Server => 2,
        }
    }
}

impl FromStr for IssueSource {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "custom" => Ok(Self::Custom),
            "schema" => Ok(Self::Schema),
            "server" => Ok(Self::Server),
            _ => Err(AppError::Validation(format!(
                "unknown issue source '{value}'"
            ))),
        }
    }
}

/// One field-scoped validation error with its originating source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    field: FieldId,
    message: NonEmptyString,
    source: IssueSource,
}

impl ValidationIssue {
    /// Creates a validated issue.
    pub fn new(field: FieldId, message: impl Into<String>, source: IssueSource) -> AppResult<Self> {
        Ok(Self {
            field,
            message: NonEmptyString::new(message)?,
            source,
        })
    }

    /// Returns the erroring field.
    #[must_use]
    pub fn field(&self) -> &FieldId {
        &self.field
    }

    /// Returns the user-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns the issue source.
    #[must_use]
    pub fn source(&self) -> IssueSource {
        self.source
    }
}

/// Per-field rejections reported by the remote system after submission.
///
/// Populated only from a rejected submission; cleared on every new
/// submission attempt and on form reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFieldErrors(BTreeMap<FieldId, String>);

impl ServerFieldErrors {
    /// Creates an empty error map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current errors with a freshly rejected map.
    pub fn replace(&mut self, errors: BTreeMap<FieldId, String>) {
        self.0 = errors;
    }

    /// Removes all errors.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Returns whether any server error is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the errors in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldId, &str)> {
        self.0.iter().map(|(field, message)| (field, message.as_str()))
    }

    /// Returns the message for one field, if rejected.
    #[must_use]
    pub fn get(&self, field: &FieldId) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}
