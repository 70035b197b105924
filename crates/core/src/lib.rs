//! Shared primitives for all Rust crates in Formkern.

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result type used across Formkern crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Opaque path identifying one logical input in a form.
///
/// A field id may address nested or indexed inputs (for example an entry
/// inside a repeatable list). It must be unique within one form instance;
/// the identifier itself carries no ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldId(String);

impl FieldId {
    /// Creates a validated field id.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "field id must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying path string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for FieldId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<FieldId> for String {
    fn from(value: FieldId) -> Self {
        value.0
    }
}

/// Identifier for one live form session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormInstanceId(Uuid);

impl FormInstanceId {
    /// Creates a random form instance identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a form instance identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for FormInstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for FormInstanceId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation conflicts with the current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Remote call failed without field-level detail.
    #[error("transport error: {0}")]
    Transport(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{FieldId, FormInstanceId, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn field_id_rejects_empty_path() {
        let result = FieldId::new("");
        assert!(result.is_err());
    }

    #[test]
    fn field_id_preserves_nested_path() {
        let field = FieldId::new("contacts[2].email");
        assert!(field.is_ok());
        assert_eq!(
            field.map(String::from).unwrap_or_default(),
            "contacts[2].email"
        );
    }

    #[test]
    fn form_instance_id_formats_as_uuid() {
        let instance_id = FormInstanceId::new();
        assert_eq!(instance_id.to_string().len(), 36);
    }
}
