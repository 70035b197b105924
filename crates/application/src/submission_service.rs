use std::sync::Arc;

use chrono::Utc;
use formkern_core::{AppError, AppResult, FieldId, FormInstanceId};
use formkern_domain::{
    Attachment, AttachmentSet, CustomRule, CustomRuleReport, FieldPathRegistry, ServerFieldErrors,
    SubmissionState, SubmissionStateMachine, ValidationIssue,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::focus_navigator::FocusNavigator;
use crate::issue_aggregator::IssueAggregator;
use crate::submission_ports::{
    AttachmentPayload, FocusHandler, PreviewReleaser, SchemaOutcome, SchemaValidator,
    SubmissionAuditAction, SubmissionAuditEvent, SubmissionAuditLog, SubmissionTransport,
    TransportOutcome,
};

/// How one call to [`SubmissionService::submit`] resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubmissionOutcome {
    /// The remote system accepted the submission.
    Accepted(Value),
    /// Client-side validation rejected the attempt; the transport was not
    /// called.
    RejectedByClient,
    /// The remote system rejected specific fields.
    RejectedByServer,
    /// The transport failed without field detail; carries the one
    /// non-field-scoped message to surface.
    TransportFailed(String),
    /// Another submission is already in flight; nothing happened.
    AlreadyInFlight,
    /// The attempt was superseded by a reset while in flight; its late
    /// outcome was discarded.
    Superseded,
}

/// Mutable state of one live form session.
struct FormSession {
    registry: FieldPathRegistry,
    custom_rules: Vec<CustomRule>,
    machine: SubmissionStateMachine,
    server_errors: ServerFieldErrors,
    issues: Vec<ValidationIssue>,
    transport_message: Option<String>,
    attachments: AttachmentSet,
}

/// Orchestrates validation, transport invocation, and state transitions
/// for one form instance.
///
/// This service is the only component permitted to mutate the submission
/// state machine and the server field errors; everything else reads them.
/// The session lock is held across validation but never across the
/// transport call, so the only re-entrancy hazards are the in-flight
/// `submit` (a guarded no-op) and a late transport outcome (discarded via
/// the attempt counter).
#[derive(Clone)]
pub struct SubmissionService {
    form_instance_id: FormInstanceId,
    session: Arc<Mutex<FormSession>>,
    schema_validator: Arc<dyn SchemaValidator>,
    transport: Arc<dyn SubmissionTransport>,
    navigator: FocusNavigator,
    preview_releaser: Arc<dyn PreviewReleaser>,
    audit_log: Arc<dyn SubmissionAuditLog>,
}

impl SubmissionService {
    /// Creates a service for one form instance.
    #[must_use]
    pub fn new(
        registry: FieldPathRegistry,
        custom_rules: Vec<CustomRule>,
        schema_validator: Arc<dyn SchemaValidator>,
        transport: Arc<dyn SubmissionTransport>,
        focus_handler: Arc<dyn FocusHandler>,
        preview_releaser: Arc<dyn PreviewReleaser>,
        audit_log: Arc<dyn SubmissionAuditLog>,
    ) -> Self {
        Self {
            form_instance_id: FormInstanceId::new(),
            session: Arc::new(Mutex::new(FormSession {
                registry,
                custom_rules,
                machine: SubmissionStateMachine::new(),
                server_errors: ServerFieldErrors::new(),
                issues: Vec::new(),
                transport_message: None,
                attachments: AttachmentSet::new(),
            })),
            schema_validator,
            transport,
            navigator: FocusNavigator::new(focus_handler, audit_log.clone()),
            preview_releaser,
            audit_log,
        }
    }

    /// Returns the form instance identifier.
    #[must_use]
    pub fn form_instance_id(&self) -> FormInstanceId {
        self.form_instance_id
    }

    /// Runs one submit attempt: validation, then transport.
    ///
    /// Client-rejected attempts never reach the transport. A call while a
    /// previous attempt's transport is still in flight is an idempotent
    /// no-op, not queued.
    pub async fn submit(&self, values: Value) -> AppResult<SubmissionOutcome> {
        let (attempt, payloads) = {
            let mut session = self.session.lock().await;
            if session.machine.is_submitting() {
                return Ok(SubmissionOutcome::AlreadyInFlight);
            }

            let attempt = session.machine.begin_validation()?;
            session.server_errors.clear();
            session.transport_message = None;
            self.append_audit(SubmissionAuditAction::AttemptStarted, attempt, None)
                .await?;

            let schema_issues = match self.schema_validator.validate(&values).await {
                Ok(SchemaOutcome::Valid) => Vec::new(),
                Ok(SchemaOutcome::Invalid(issues)) => issues,
                Err(error) => {
                    // A validator fault is a collaborator bug, not a failed
                    // validation; the pass is abandoned, not recorded.
                    session.machine.abort_validation();
                    return Err(error);
                }
            };

            let custom_reports: Vec<CustomRuleReport> = session
                .custom_rules
                .iter()
                .map(|rule| rule.evaluate(&values))
                .collect();

            let issues = IssueAggregator::aggregate(
                &session.registry,
                &schema_issues,
                &custom_reports,
                &session.server_errors,
            )?;
            session.issues = issues;

            if !session.issues.is_empty() {
                session.machine.validation_failed()?;
                self.navigator
                    .navigate_to_first(
                        self.form_instance_id,
                        attempt,
                        &session.registry,
                        &session.issues,
                    )
                    .await?;
                self.append_audit(
                    SubmissionAuditAction::ClientRejected,
                    attempt,
                    Some(format!("{} field issue(s)", session.issues.len())),
                )
                .await?;
                return Ok(SubmissionOutcome::RejectedByClient);
            }

            session.machine.begin_submit()?;
            let payloads: Vec<AttachmentPayload> = session
                .attachments
                .iter()
                .map(AttachmentPayload::from)
                .collect();
            (attempt, payloads)
        };

        let transport_result = self.transport.submit(&values, &payloads).await;

        let mut session = self.session.lock().await;
        if session.machine.attempt() != attempt || !session.machine.is_submitting() {
            self.append_audit(
                SubmissionAuditAction::StaleOutcomeDiscarded,
                attempt,
                Some("transport outcome resolved for a superseded attempt".to_owned()),
            )
            .await?;
            return Ok(SubmissionOutcome::Superseded);
        }

        match transport_result {
            Ok(TransportOutcome::Accepted(data)) => {
                session.machine.submitted()?;
                session.issues.clear();
                self.append_audit(SubmissionAuditAction::Accepted, attempt, None)
                    .await?;
                Ok(SubmissionOutcome::Accepted(data))
            }
            Ok(TransportOutcome::RejectedFields(field_errors)) => {
                session.server_errors.replace(field_errors);
                session.machine.rejected()?;
                let issues = IssueAggregator::aggregate(
                    &session.registry,
                    &[],
                    &[],
                    &session.server_errors,
                )?;
                session.issues = issues;
                self.navigator
                    .navigate_to_first(
                        self.form_instance_id,
                        attempt,
                        &session.registry,
                        &session.issues,
                    )
                    .await?;
                self.append_audit(
                    SubmissionAuditAction::ServerRejected,
                    attempt,
                    Some(format!("{} field error(s)", session.issues.len())),
                )
                .await?;
                Ok(SubmissionOutcome::RejectedByServer)
            }
            Ok(TransportOutcome::RejectedMessage(message)) => {
                self.record_transport_failure(&mut session, attempt, message)
                    .await
            }
            Err(error) => {
                // Transport-level faults are reclassified, never escaped.
                self.record_transport_failure(&mut session, attempt, error.to_string())
                    .await
            }
        }
    }

    /// Re-runs a failed attempt, starting from validation.
    ///
    /// Previous server errors are not assumed to still be valid; they are
    /// cleared when the new attempt enters validation.
    pub async fn retry(&self, values: Value) -> AppResult<SubmissionOutcome> {
        {
            let session = self.session.lock().await;
            if !matches!(session.machine.state(), SubmissionState::Failed(_)) {
                return Err(AppError::Conflict(format!(
                    "retry is only allowed from a failed state, not '{}'",
                    session.machine.state().as_str()
                )));
            }
        }

        self.submit(values).await
    }

    /// Resets the session to idle.
    ///
    /// Clears server errors and aggregated issues, releases every preview
    /// handle, and bumps the attempt counter so an in-flight transport
    /// outcome is discarded instead of applied.
    pub async fn reset(&self) -> AppResult<()> {
        self.clear_session("reset requested").await
    }

    /// Tears the session down on form unmount.
    ///
    /// Identical to [`Self::reset`] apart from the audit detail: preview
    /// handles are released exactly once and in-flight outcomes become
    /// stale.
    pub async fn teardown(&self) -> AppResult<()> {
        self.clear_session("form teardown").await
    }

    /// Adds or replaces the attachment for its field.
    ///
    /// Disallowed while a submission is in flight. The preview handle of a
    /// replaced attachment is released immediately.
    pub async fn attach(&self, attachment: Attachment) -> AppResult<()> {
        let displaced = {
            let mut session = self.session.lock().await;
            self.require_not_submitting(&session.machine, "attach")?;
            session.attachments.attach(attachment)
        };

        if let Some(handle) = displaced {
            self.preview_releaser.release(handle).await?;
        }

        Ok(())
    }

    /// Removes the attachment for a field, releasing its preview handle.
    ///
    /// Disallowed while a submission is in flight.
    pub async fn remove_attachment(&self, field: &FieldId) -> AppResult<()> {
        let removed = {
            let mut session = self.session.lock().await;
            self.require_not_submitting(&session.machine, "remove_attachment")?;
            session.attachments.remove(field)
        };

        if let Some(handle) = removed {
            self.preview_releaser.release(handle).await?;
        }

        Ok(())
    }

    /// Re-registers one contiguous sub-range of the field order.
    ///
    /// Used by forms with conditionally revealed sections; unrelated field
    /// positions are untouched. Disallowed while a submission is in flight.
    pub async fn replace_field_section(
        &self,
        start: usize,
        replaced_len: usize,
        fields: Vec<FieldId>,
    ) -> AppResult<()> {
        let mut session = self.session.lock().await;
        self.require_not_submitting(&session.machine, "replace_field_section")?;
        session.registry.replace_section(start, replaced_len, fields)
    }

    /// Returns the current submission state.
    pub async fn state(&self) -> SubmissionState {
        self.session.lock().await.machine.state()
    }

    /// Returns the issues currently visible to the user, in field order.
    ///
    /// Empty before the first submit attempt unless `force_show` is set.
    pub async fn visible_issues(&self, force_show: bool) -> Vec<ValidationIssue> {
        let session = self.session.lock().await;
        IssueAggregator::visible_issues(&session.issues, &session.machine, force_show).to_vec()
    }

    /// Returns the non-field-scoped message of the last transport failure.
    pub async fn transport_failure_message(&self) -> Option<String> {
        self.session.lock().await.transport_message.clone()
    }

    /// Returns the number of attachments currently held by the session.
    pub async fn attachment_count(&self) -> usize {
        self.session.lock().await.attachments.len()
    }

    async fn clear_session(&self, detail: &str) -> AppResult<()> {
        let (attempt, handles) = {
            let mut session = self.session.lock().await;
            session.server_errors.clear();
            session.issues.clear();
            session.transport_message = None;
            session.machine.reset();
            (session.machine.attempt(), session.attachments.drain_previews())
        };

        // Every drained handle must reach the releaser, even after one
        // release fails; only the first error is reported.
        let mut release_error = None;
        for handle in handles {
            if let Err(error) = self.preview_releaser.release(handle).await {
                release_error.get_or_insert(error);
            }
        }

        self.append_audit(
            SubmissionAuditAction::SessionReset,
            attempt,
            Some(detail.to_owned()),
        )
        .await?;

        match release_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn record_transport_failure(
        &self,
        session: &mut FormSession,
        attempt: u64,
        message: String,
    ) -> AppResult<SubmissionOutcome> {
        session.machine.transport_failed()?;
        session.transport_message = Some(message.clone());
        self.append_audit(
            SubmissionAuditAction::TransportFailed,
            attempt,
            Some(message.clone()),
        )
        .await?;

        Ok(SubmissionOutcome::TransportFailed(message))
    }

    fn require_not_submitting(
        &self,
        machine: &SubmissionStateMachine,
        operation: &str,
    ) -> AppResult<()> {
        if machine.is_submitting() {
            return Err(AppError::Conflict(format!(
                "'{operation}' is not allowed while a submission is in flight"
            )));
        }

        Ok(())
    }

    async fn append_audit(
        &self,
        action: SubmissionAuditAction,
        attempt: u64,
        detail: Option<String>,
    ) -> AppResult<()> {
        self.audit_log
            .append_event(SubmissionAuditEvent {
                form_instance_id: self.form_instance_id,
                action,
                attempt,
                detail,
                occurred_at: Utc::now(),
            })
            .await
    }
}
