use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use formkern_core::{AppResult, FieldId, FormInstanceId};
use formkern_domain::{FieldPathRegistry, ValidationIssue};

use crate::submission_ports::{
    FocusHandler, SubmissionAuditAction, SubmissionAuditEvent, SubmissionAuditLog,
};

/// Deterministically activates the first erroring field of a form.
///
/// The navigator walks the canonical field order, not the issue list, so
/// the chosen target is identical for any permutation of the same issue
/// set. Issue fields that are missing from the order cannot receive focus;
/// each one is flagged to the audit log instead of failing the pass.
#[derive(Clone)]
pub struct FocusNavigator {
    focus_handler: Arc<dyn FocusHandler>,
    audit_log: Arc<dyn SubmissionAuditLog>,
}

impl FocusNavigator {
    /// Creates a navigator from the UI and audit collaborators.
    #[must_use]
    pub fn new(focus_handler: Arc<dyn FocusHandler>, audit_log: Arc<dyn SubmissionAuditLog>) -> Self {
        Self {
            focus_handler,
            audit_log,
        }
    }

    /// Scrolls to and focuses the first field with a visible issue.
    ///
    /// Returns the targeted field, or `None` when no issue field is
    /// registered in the field order.
    pub async fn navigate_to_first(
        &self,
        form_instance_id: FormInstanceId,
        attempt: u64,
        registry: &FieldPathRegistry,
        issues: &[ValidationIssue],
    ) -> AppResult<Option<FieldId>> {
        let issue_fields: BTreeSet<&FieldId> =
            issues.iter().map(ValidationIssue::field).collect();

        for field in &issue_fields {
            if !registry.contains(field) {
                self.audit_log
                    .append_event(SubmissionAuditEvent {
                        form_instance_id,
                        action: SubmissionAuditAction::RegistryGapDetected,
                        attempt,
                        detail: Some(format!(
                            "field '{}' has an issue but is not in the field order and cannot receive focus",
                            field.as_str()
                        )),
                        occurred_at: Utc::now(),
                    })
                    .await?;
            }
        }

        for field in registry.order() {
            if issue_fields.contains(field) {
                self.focus_handler.scroll_to(field).await?;
                self.focus_handler.focus(field).await?;
                return Ok(Some(field.clone()));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use formkern_core::{AppResult, FieldId, FormInstanceId};
    use formkern_domain::{FieldPathRegistry, IssueSource, ValidationIssue};
    use tokio::sync::Mutex;

    use super::FocusNavigator;
    use crate::submission_ports::{
        FocusHandler, SubmissionAuditAction, SubmissionAuditEvent, SubmissionAuditLog,
    };

    #[derive(Default)]
    struct RecordingFocusHandler {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FocusHandler for RecordingFocusHandler {
        async fn scroll_to(&self, field: &FieldId) -> AppResult<()> {
            self.calls
                .lock()
                .await
                .push(format!("scroll:{}", field.as_str()));
            Ok(())
        }

        async fn focus(&self, field: &FieldId) -> AppResult<()> {
            self.calls
                .lock()
                .await
                .push(format!("focus:{}", field.as_str()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingAuditLog {
        events: Mutex<Vec<SubmissionAuditEvent>>,
    }

    #[async_trait]
    impl SubmissionAuditLog for RecordingAuditLog {
        async fn append_event(&self, event: SubmissionAuditEvent) -> AppResult<()> {
            self.events.lock().await.push(event);
            Ok(())
        }
    }

    fn field(name: &str) -> FieldId {
        FieldId::new(name).unwrap_or_else(|_| unreachable!("test field ids are non-empty"))
    }

    fn registry(names: &[&str]) -> FieldPathRegistry {
        FieldPathRegistry::new(names.iter().map(|name| field(name)).collect())
            .unwrap_or_else(|_| unreachable!("test field orders are unique"))
    }

    fn issues(names: &[&str]) -> Vec<ValidationIssue> {
        names
            .iter()
            .filter_map(|name| {
                ValidationIssue::new(field(name), "required", IssueSource::Schema).ok()
            })
            .collect()
    }

    #[tokio::test]
    async fn targets_first_field_in_canonical_order() {
        let focus_handler = Arc::new(RecordingFocusHandler::default());
        let audit_log = Arc::new(RecordingAuditLog::default());
        let navigator = FocusNavigator::new(focus_handler.clone(), audit_log);

        let target = navigator
            .navigate_to_first(
                FormInstanceId::new(),
                1,
                &registry(&["a", "b", "c"]),
                &issues(&["c", "a"]),
            )
            .await;

        assert_eq!(
            target.ok().flatten().map(|field| field.as_str().to_owned()),
            Some("a".to_owned())
        );
        let calls = focus_handler.calls.lock().await;
        assert_eq!(*calls, vec!["scroll:a".to_owned(), "focus:a".to_owned()]);
    }

    #[tokio::test]
    async fn reordering_the_field_order_changes_the_target() {
        let focus_handler = Arc::new(RecordingFocusHandler::default());
        let audit_log = Arc::new(RecordingAuditLog::default());
        let navigator = FocusNavigator::new(focus_handler, audit_log);

        let target = navigator
            .navigate_to_first(
                FormInstanceId::new(),
                1,
                &registry(&["c", "a", "b"]),
                &issues(&["c", "a"]),
            )
            .await;

        assert_eq!(
            target.ok().flatten().map(|field| field.as_str().to_owned()),
            Some("c".to_owned())
        );
    }

    #[tokio::test]
    async fn registry_gap_is_audited_and_navigation_skips_it() {
        let focus_handler = Arc::new(RecordingFocusHandler::default());
        let audit_log = Arc::new(RecordingAuditLog::default());
        let navigator = FocusNavigator::new(focus_handler.clone(), audit_log.clone());

        let target = navigator
            .navigate_to_first(
                FormInstanceId::new(),
                3,
                &registry(&["a", "b"]),
                &issues(&["orphan"]),
            )
            .await;

        assert_eq!(target.ok().flatten(), None);
        assert!(focus_handler.calls.lock().await.is_empty());

        let events = audit_log.events.lock().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, SubmissionAuditAction::RegistryGapDetected);
        assert_eq!(events[0].attempt, 3);
    }
}
