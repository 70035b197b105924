//! Audit log adapter that writes submission events to tracing output.

use async_trait::async_trait;
use formkern_application::{SubmissionAuditAction, SubmissionAuditEvent, SubmissionAuditLog};
use formkern_core::AppResult;
use tracing::{info, warn};

/// Tracing-backed audit sink.
///
/// Registry gaps, stale discards, and transport failures are logged at
/// warn level so form audits can grep for them; the rest of the lifecycle
/// logs at info level.
#[derive(Clone)]
pub struct TracingSubmissionAuditLog;

impl TracingSubmissionAuditLog {
    /// Creates a new tracing audit log.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingSubmissionAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubmissionAuditLog for TracingSubmissionAuditLog {
    async fn append_event(&self, event: SubmissionAuditEvent) -> AppResult<()> {
        let detail = event.detail.as_deref().unwrap_or_default();

        match event.action {
            SubmissionAuditAction::RegistryGapDetected
            | SubmissionAuditAction::StaleOutcomeDiscarded
            | SubmissionAuditAction::TransportFailed => {
                warn!(
                    form_instance_id = %event.form_instance_id,
                    action = event.action.as_str(),
                    attempt = event.attempt,
                    detail = detail,
                    "submission audit event"
                );
            }
            _ => {
                info!(
                    form_instance_id = %event.form_instance_id,
                    action = event.action.as_str(),
                    attempt = event.attempt,
                    detail = detail,
                    "submission audit event"
                );
            }
        }

        Ok(())
    }
}
