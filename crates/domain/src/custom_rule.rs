use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use formkern_core::{AppResult, FieldId, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

type Predicate = dyn Fn(&Value) -> bool + Send + Sync;

/// A runtime validation rule not expressible in the declarative schema.
///
/// Examples from the forms this engine serves: "at least one of four
/// toggles must be on", "end date must not precede start date". The rule is
/// re-evaluated against the full value tree on every validation pass.
#[derive(Clone)]
pub struct CustomRule {
    field: FieldId,
    message: NonEmptyString,
    predicate: Arc<Predicate>,
}

impl CustomRule {
    /// Creates a rule that reports `message` on `field` when the predicate
    /// returns false.
    pub fn new(
        field: FieldId,
        message: impl Into<String>,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> AppResult<Self> {
        Ok(Self {
            field,
            message: NonEmptyString::new(message)?,
            predicate: Arc::new(predicate),
        })
    }

    /// Returns the field the rule reports on.
    #[must_use]
    pub fn field(&self) -> &FieldId {
        &self.field
    }

    /// Evaluates the rule against the current value tree.
    #[must_use]
    pub fn evaluate(&self, values: &Value) -> CustomRuleReport {
        CustomRuleReport {
            field: self.field.clone(),
            is_valid: (self.predicate)(values),
            message: self.message.as_str().to_owned(),
        }
    }
}

impl Debug for CustomRule {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CustomRule")
            .field("field", &self.field)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Outcome of evaluating one custom rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRuleReport {
    field: FieldId,
    is_valid: bool,
    message: String,
}

impl CustomRuleReport {
    /// Returns the field the report applies to.
    #[must_use]
    pub fn field(&self) -> &FieldId {
        &self.field
    }

    /// Returns whether the rule held.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Returns the message shown when the rule fails.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use formkern_core::FieldId;
    use serde_json::json;

    use super::CustomRule;

    #[test]
    fn evaluate_reports_failing_predicate() {
        let field = FieldId::new("period.end");
        assert!(field.is_ok());
        let Ok(field) = field else {
            return;
        };

        let rule = CustomRule::new(field, "end date must not precede start date", |values| {
            let start = values.get("period").and_then(|period| period.get("start"));
            let end = values.get("period").and_then(|period| period.get("end"));
            match (start.and_then(|value| value.as_str()), end.and_then(|value| value.as_str())) {
                (Some(start), Some(end)) => end >= start,
                _ => true,
            }
        });
        assert!(rule.is_ok());
        let Ok(rule) = rule else {
            return;
        };

        let invalid = rule.evaluate(&json!({"period": {"start": "2026-03-01", "end": "2026-02-01"}}));
        assert!(!invalid.is_valid());
        assert_eq!(invalid.message(), "end date must not precede start date");

        let valid = rule.evaluate(&json!({"period": {"start": "2026-03-01", "end": "2026-03-02"}}));
        assert!(valid.is_valid());
    }
}
