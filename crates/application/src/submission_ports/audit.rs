use async_trait::async_trait;
use chrono::{DateTime, Utc};
use formkern_core::{AppResult, FormInstanceId};
use serde::{Deserialize, Serialize};

/// Auditable moments in the submission lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionAuditAction {
    /// A new submit attempt entered validation.
    AttemptStarted,
    /// Client-side validation rejected the attempt.
    ClientRejected,
    /// The remote system accepted the submission.
    Accepted,
    /// The remote system rejected specific fields.
    ServerRejected,
    /// The transport failed without field detail.
    TransportFailed,
    /// An erroring field is missing from the field order and cannot
    /// receive focus.
    RegistryGapDetected,
    /// A transport outcome resolved for a superseded attempt and was
    /// discarded.
    StaleOutcomeDiscarded,
    /// The session was reset or torn down.
    SessionReset,
}

impl SubmissionAuditAction {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AttemptStarted => "attempt_started",
            Self::ClientRejected => "client_rejected",
            Self::Accepted => "accepted",
            Self::ServerRejected => "server_rejected",
            Self::TransportFailed => "transport_failed",
            Self::RegistryGapDetected => "registry_gap_detected",
            Self::StaleOutcomeDiscarded => "stale_outcome_discarded",
            Self::SessionReset => "session_reset",
        }
    }
}

/// One audit record appended by the submission orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionAuditEvent {
    /// Form session the event belongs to.
    pub form_instance_id: FormInstanceId,
    /// What happened.
    pub action: SubmissionAuditAction,
    /// Attempt counter value at the time of the event.
    pub attempt: u64,
    /// Optional human-readable detail.
    pub detail: Option<String>,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
}

/// Audit sink for submission lifecycle events.
#[async_trait]
pub trait SubmissionAuditLog: Send + Sync {
    /// Appends one audit event.
    async fn append_event(&self, event: SubmissionAuditEvent) -> AppResult<()>;
}
