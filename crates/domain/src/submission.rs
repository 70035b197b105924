use formkern_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Why a submission attempt ended in failure.
///
/// Used only for messaging, never for control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// A schema or custom rule failed before any network call.
    ClientValidation,
    /// The remote system rejected specific fields.
    ServerValidation,
    /// The remote call failed without field-level detail.
    Transport,
}

impl FailureReason {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientValidation => "client_validation",
            Self::ServerValidation => "server_validation",
            Self::Transport => "transport",
        }
    }
}

/// Lifecycle state of one form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    /// No attempt in progress; errors are not yet user-visible.
    Idle,
    /// Client-side validation is running.
    Validating,
    /// The transport call is in flight.
    Submitting,
    /// The last attempt was accepted.
    Succeeded,
    /// The last attempt failed for the tagged reason.
    Failed(FailureReason),
}

impl SubmissionState {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Submitting => "submitting",
            Self::Succeeded => "succeeded",
            Self::Failed(FailureReason::ClientValidation) => "failed_client_validation",
            Self::Failed(FailureReason::ServerValidation) => "failed_server_validation",
            Self::Failed(FailureReason::Transport) => "failed_transport",
        }
    }
}

/// Tracks the submission lifecycle of one form instance.
///
/// Transitions are driven exclusively by the submission orchestrator; all
/// other components only read the state. The machine also carries the two
/// signals derived from the lifecycle: whether at least one submit attempt
/// has occurred (the error-visibility gate) and a monotonically increasing
/// attempt counter used to discard stale transport outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionStateMachine {
    state: SubmissionState,
    attempted: bool,
    attempt: u64,
}

impl SubmissionStateMachine {
    /// Creates a machine in the idle state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SubmissionState::Idle,
            attempted: false,
            attempt: 0,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Returns whether at least one submit attempt has occurred.
    #[must_use]
    pub fn has_attempted(&self) -> bool {
        self.attempted
    }

    /// Returns the current attempt counter value.
    #[must_use]
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Returns whether a transport call is currently in flight.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    /// Starts a new validation pass and returns its attempt number.
    ///
    /// Allowed from `Idle`, any `Failed` state (retry), and `Succeeded`
    /// (resubmission intent). A call while `Submitting` is an invalid
    /// transition; the orchestrator treats that case as a no-op before ever
    /// reaching the machine.
    pub fn begin_validation(&mut self) -> AppResult<u64> {
        match self.state {
            SubmissionState::Idle | SubmissionState::Succeeded | SubmissionState::Failed(_) => {
                self.state = SubmissionState::Validating;
                self.attempted = true;
                self.attempt += 1;
                Ok(self.attempt)
            }
            SubmissionState::Validating | SubmissionState::Submitting => {
                Err(self.invalid_transition("begin_validation"))
            }
        }
    }

    /// Abandons a validation pass after a collaborator fault.
    ///
    /// The pass neither failed nor succeeded, so the machine returns to
    /// idle instead of recording a failed validation; a later submit can
    /// start cleanly. A no-op outside `Validating`.
    pub fn abort_validation(&mut self) {
        if self.state == SubmissionState::Validating {
            self.state = SubmissionState::Idle;
        }
    }

    /// Records a failed client-side validation pass.
    pub fn validation_failed(&mut self) -> AppResult<()> {
        self.transition_from(
            SubmissionState::Validating,
            SubmissionState::Failed(FailureReason::ClientValidation),
            "validation_failed",
        )
    }

    /// Moves a successfully validated attempt into the transport call.
    pub fn begin_submit(&mut self) -> AppResult<()> {
        self.transition_from(
            SubmissionState::Validating,
            SubmissionState::Submitting,
            "begin_submit",
        )
    }

    /// Records transport acceptance.
    pub fn submitted(&mut self) -> AppResult<()> {
        self.transition_from(
            SubmissionState::Submitting,
            SubmissionState::Succeeded,
            "submitted",
        )
    }

    /// Records a server rejection carrying field errors.
    pub fn rejected(&mut self) -> AppResult<()> {
        self.transition_from(
            SubmissionState::Submitting,
            SubmissionState::Failed(FailureReason::ServerValidation),
            "rejected",
        )
    }

    /// Records a transport-level failure without field detail.
    pub fn transport_failed(&mut self) -> AppResult<()> {
        self.transition_from(
            SubmissionState::Submitting,
            SubmissionState::Failed(FailureReason::Transport),
            "transport_failed",
        )
    }

    /// Returns the machine to idle and invalidates in-flight attempts.
    ///
    /// Allowed from every state. The attempt counter is bumped so a
    /// transport outcome still in flight resolves against a stale attempt
    /// number and is discarded instead of resurrecting dismissed state.
    pub fn reset(&mut self) {
        self.state = SubmissionState::Idle;
        self.attempted = false;
        self.attempt += 1;
    }

    fn transition_from(
        &mut self,
        expected: SubmissionState,
        next: SubmissionState,
        operation: &str,
    ) -> AppResult<()> {
        if self.state != expected {
            return Err(self.invalid_transition(operation));
        }

        self.state = next;
        Ok(())
    }

    fn invalid_transition(&self, operation: &str) -> AppError {
        AppError::Conflict(format!(
            "submission transition '{}' is not allowed from state '{}'",
            operation,
            self.state.as_str()
        ))
    }
}

impl Default for SubmissionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{FailureReason, SubmissionState, SubmissionStateMachine};

    #[test]
    fn happy_path_reaches_succeeded() {
        let mut machine = SubmissionStateMachine::new();
        assert_eq!(machine.state(), SubmissionState::Idle);
        assert!(!machine.has_attempted());

        assert_eq!(machine.begin_validation().ok(), Some(1));
        assert!(machine.begin_submit().is_ok());
        assert!(machine.is_submitting());
        assert!(machine.submitted().is_ok());
        assert_eq!(machine.state(), SubmissionState::Succeeded);
        assert!(machine.has_attempted());
    }

    #[test]
    fn client_validation_failure_keeps_transport_untouchable() {
        let mut machine = SubmissionStateMachine::new();
        assert!(machine.begin_validation().is_ok());
        assert!(machine.validation_failed().is_ok());
        assert_eq!(
            machine.state(),
            SubmissionState::Failed(FailureReason::ClientValidation)
        );

        // No transport transition is reachable from a failed validation.
        assert!(machine.submitted().is_err());
        assert!(machine.rejected().is_err());
    }

    #[test]
    fn retry_re_enters_validation_from_failure() {
        let mut machine = SubmissionStateMachine::new();
        assert!(machine.begin_validation().is_ok());
        assert!(machine.begin_submit().is_ok());
        assert!(machine.transport_failed().is_ok());

        assert_eq!(machine.begin_validation().ok(), Some(2));
        assert_eq!(machine.state(), SubmissionState::Validating);
    }

    #[test]
    fn aborted_validation_returns_to_idle_not_failed() {
        let mut machine = SubmissionStateMachine::new();
        assert!(machine.begin_validation().is_ok());

        machine.abort_validation();
        assert_eq!(machine.state(), SubmissionState::Idle);

        // The next attempt starts normally.
        assert_eq!(machine.begin_validation().ok(), Some(2));
    }

    #[test]
    fn begin_validation_is_rejected_while_submitting() {
        let mut machine = SubmissionStateMachine::new();
        assert!(machine.begin_validation().is_ok());
        assert!(machine.begin_submit().is_ok());
        assert!(machine.begin_validation().is_err());
    }

    #[test]
    fn reset_clears_attempt_visibility_and_bumps_counter() {
        let mut machine = SubmissionStateMachine::new();
        assert!(machine.begin_validation().is_ok());
        assert!(machine.begin_submit().is_ok());
        let in_flight = machine.attempt();

        machine.reset();
        assert_eq!(machine.state(), SubmissionState::Idle);
        assert!(!machine.has_attempted());
        assert!(machine.attempt() > in_flight);
    }
}
