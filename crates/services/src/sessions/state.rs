use std::fmt;

use lesson_core::countdown::CountdownLevel;
use lesson_core::model::{QuizAttempt, QuizResult, ReadingSession};

use super::timer::ActiveTimer;
use crate::notice::FailureReason;

/// Observable tag of the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    NotStarted,
    Locked,
    Reading,
    /// Transient: the countdown ran out.
    Expired,
    /// Transient: reading ended by the trainee or the estimator.
    FinishedReading,
    Questioning,
    Passed,
    Failed,
    Disposed,
}

impl SessionState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Disposed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::NotStarted => "not started",
            SessionState::Locked => "locked",
            SessionState::Reading => "reading",
            SessionState::Expired => "expired",
            SessionState::FinishedReading => "finished reading",
            SessionState::Questioning => "questioning",
            SessionState::Passed => "passed",
            SessionState::Failed => "failed",
            SessionState::Disposed => "disposed",
        };
        f.write_str(label)
    }
}

/// Everything a host may want to render, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    StateChanged { from: SessionState, to: SessionState },
    Countdown { remaining_ms: i64, level: CountdownLevel },
}

/// Owned data of each state. Reading and quiz data can never coexist.
#[derive(Debug)]
pub(crate) enum Phase {
    NotStarted,
    Locked { remaining_ms: i64 },
    Reading { reading: ReadingSession, timer: ActiveTimer },
    Questioning { attempt: QuizAttempt },
    Passed { result: Option<QuizResult> },
    Failed { reason: FailureReason, result: Option<QuizResult> },
    Disposed,
}

impl Phase {
    pub(crate) fn state(&self) -> SessionState {
        match self {
            Phase::NotStarted => SessionState::NotStarted,
            Phase::Locked { .. } => SessionState::Locked,
            Phase::Reading { .. } => SessionState::Reading,
            Phase::Questioning { .. } => SessionState::Questioning,
            Phase::Passed { .. } => SessionState::Passed,
            Phase::Failed { .. } => SessionState::Failed,
            Phase::Disposed => SessionState::Disposed,
        }
    }
}
