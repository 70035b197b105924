use std::collections::BTreeSet;

use async_trait::async_trait;
use formkern_application::{SchemaIssue, SchemaOutcome, SchemaValidator};
use formkern_core::{AppError, AppResult, FieldId, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One declarative constraint on a field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaConstraint {
    /// The value must be present and non-blank.
    Required,
    /// A string value must have at least this many characters.
    MinLength(usize),
    /// A string value must have at most this many characters.
    MaxLength(usize),
    /// A string value must be structurally an email address.
    Email,
    /// A numeric value must fall inside the inclusive range.
    NumberRange {
        /// Inclusive lower bound.
        min: Option<f64>,
        /// Inclusive upper bound.
        max: Option<f64>,
    },
    /// A string value must be one of the listed options.
    OneOf(Vec<String>),
    /// An ISO-8601 date string must not precede the other field's value.
    NotBefore {
        /// Field holding the earlier bound.
        other: FieldId,
    },
}

/// One field rule in a declarative form schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRule {
    field: FieldId,
    constraint: SchemaConstraint,
    message: NonEmptyString,
}

impl SchemaRule {
    /// Creates a validated rule.
    pub fn new(
        field: FieldId,
        constraint: SchemaConstraint,
        message: impl Into<String>,
    ) -> AppResult<Self> {
        match &constraint {
            SchemaConstraint::NumberRange {
                min: Some(min),
                max: Some(max),
            } if min > max => {
                return Err(AppError::Validation(format!(
                    "number range lower bound '{min}' exceeds upper bound '{max}'"
                )));
            }
            SchemaConstraint::OneOf(options) if options.is_empty() => {
                return Err(AppError::Validation(
                    "one_of constraint requires at least one option".to_owned(),
                ));
            }
            _ => {}
        }

        Ok(Self {
            field,
            constraint,
            message: NonEmptyString::new(message)?,
        })
    }

    /// Returns the field the rule applies to.
    #[must_use]
    pub fn field(&self) -> &FieldId {
        &self.field
    }

    /// Returns the message reported when the rule fails.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    fn holds(&self, values: &Value) -> bool {
        let value = lookup(values, self.field.as_str());

        match &self.constraint {
            SchemaConstraint::Required => match value {
                None | Some(Value::Null) => false,
                Some(Value::String(text)) => !text.trim().is_empty(),
                Some(Value::Array(items)) => !items.is_empty(),
                Some(_) => true,
            },
            SchemaConstraint::MinLength(min) => {
                with_present_string(value, |text| text.chars().count() >= *min)
            }
            SchemaConstraint::MaxLength(max) => {
                with_present_string(value, |text| text.chars().count() <= *max)
            }
            SchemaConstraint::Email => with_present_string(value, is_structural_email),
            SchemaConstraint::NumberRange { min, max } => match value.and_then(value_as_f64) {
                None => value.is_none_or(Value::is_null),
                Some(number) => {
                    min.is_none_or(|min| number >= min) && max.is_none_or(|max| number <= max)
                }
            },
            SchemaConstraint::OneOf(options) => {
                with_present_string(value, |text| options.iter().any(|option| option == text))
            }
            SchemaConstraint::NotBefore { other } => {
                let bound = lookup(values, other.as_str()).and_then(Value::as_str);
                match (value.and_then(Value::as_str), bound) {
                    (Some(value), Some(bound)) => value >= bound,
                    _ => true,
                }
            }
        }
    }
}

/// Schema validator over a declarative per-field rule set.
///
/// Rules are evaluated in declaration order; at most one message is
/// reported per field. Constraints other than `Required` hold for missing
/// or null values, so optional fields validate only when filled in.
pub struct RuleSetSchemaValidator {
    rules: Vec<SchemaRule>,
}

impl RuleSetSchemaValidator {
    /// Creates a validator from a rule set.
    #[must_use]
    pub fn new(rules: Vec<SchemaRule>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl SchemaValidator for RuleSetSchemaValidator {
    async fn validate(&self, values: &Value) -> AppResult<SchemaOutcome> {
        let mut failed: BTreeSet<&FieldId> = BTreeSet::new();
        let mut issues = Vec::new();

        for rule in &self.rules {
            if failed.contains(rule.field()) {
                continue;
            }

            if !rule.holds(values) {
                issues.push(SchemaIssue {
                    field: rule.field().clone(),
                    message: rule.message().to_owned(),
                });
                failed.insert(rule.field());
            }
        }

        if issues.is_empty() {
            Ok(SchemaOutcome::Valid)
        } else {
            Ok(SchemaOutcome::Invalid(issues))
        }
    }
}

fn with_present_string(value: Option<&Value>, check: impl Fn(&str) -> bool) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => check(text),
        Some(_) => false,
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    if let Some(number) = value.as_f64() {
        return Some(number);
    }

    value.as_str().and_then(|raw| raw.parse::<f64>().ok())
}

fn is_structural_email(value: &str) -> bool {
    let trimmed = value.trim();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return false;
    };

    !local.is_empty() && !domain.is_empty() && domain.contains('.') && !domain.contains('@')
}

/// Resolves a dotted, optionally indexed field path in the value tree.
fn lookup<'a>(values: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = values;

    for segment in path.split('.') {
        let mut parts = segment.split('[');
        let name = parts.next()?;

        if !name.is_empty() {
            current = current.as_object()?.get(name)?;
        }

        for indexed in parts {
            let index = indexed.strip_suffix(']')?.parse::<usize>().ok()?;
            current = current.as_array()?.get(index)?;
        }
    }

    Some(current)
}
