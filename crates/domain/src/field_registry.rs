use std::collections::HashSet;

use formkern_core::{AppError, AppResult, FieldId};
use serde::{Deserialize, Serialize};

/// Canonical traversal order of the fields in one form.
///
/// The registry is the single source of field ordering: error navigation
/// walks it top to bottom, so every field that can produce an error must be
/// registered or it becomes unreachable for focus navigation. A field id
/// missing from the registry is a non-fatal gap; callers are expected to
/// flag it for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPathRegistry {
    order: Vec<FieldId>,
}

impl FieldPathRegistry {
    /// Creates a registry from the declared visual order.
    pub fn new(order: Vec<FieldId>) -> AppResult<Self> {
        Self::require_unique(&order)?;
        Ok(Self { order })
    }

    /// Returns the canonical field order.
    #[must_use]
    pub fn order(&self) -> &[FieldId] {
        &self.order
    }

    /// Returns the position of a field in the canonical order.
    #[must_use]
    pub fn index_of(&self, field: &FieldId) -> Option<usize> {
        self.order.iter().position(|candidate| candidate == field)
    }

    /// Returns whether the field is reachable by focus navigation.
    #[must_use]
    pub fn contains(&self, field: &FieldId) -> bool {
        self.index_of(field).is_some()
    }

    /// Returns the number of registered fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Replaces one contiguous sub-range of the order.
    ///
    /// Forms with conditionally revealed sections re-register only the
    /// affected sub-range; fields before `start` and after the replaced
    /// range keep their relative positions.
    pub fn replace_section(
        &mut self,
        start: usize,
        replaced_len: usize,
        fields: Vec<FieldId>,
    ) -> AppResult<()> {
        let end = start
            .checked_add(replaced_len)
            .filter(|end| *end <= self.order.len())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "section range {}..{} is outside the registered order of length {}",
                    start,
                    start.saturating_add(replaced_len),
                    self.order.len()
                ))
            })?;

        let mut updated = Vec::with_capacity(self.order.len() - replaced_len + fields.len());
        updated.extend_from_slice(&self.order[..start]);
        updated.extend(fields);
        updated.extend_from_slice(&self.order[end..]);

        Self::require_unique(&updated)?;
        self.order = updated;
        Ok(())
    }

    fn require_unique(order: &[FieldId]) -> AppResult<()> {
        let mut seen = HashSet::new();
        for field in order {
            if !seen.insert(field.as_str().to_owned()) {
                return Err(AppError::Validation(format!(
                    "duplicate field id '{}' in field order",
                    field.as_str()
                )));
            }
        }

        Ok(())
    }
}
