use lesson_core::countdown::CountdownLevel;
use lesson_core::display::{format_countdown, format_remaining};
use lesson_core::model::{LessonId, ProgressPercent, QuizResult, SessionId};

use super::state::SessionState;
use crate::notice::FailureReason;

/// Position inside the quiz, present only while `Questioning`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizPosition {
    pub current_index: usize,
    pub question_count: usize,
    pub selected: Option<usize>,
    pub unanswered: usize,
}

/// Everything a host needs to render one session at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub lesson_id: LessonId,
    pub state: SessionState,
    pub progress_percent: ProgressPercent,
    /// Countdown of a time-boxed lesson while reading.
    pub remaining_ms: Option<i64>,
    pub countdown_level: Option<CountdownLevel>,
    /// Zero unless the lesson is locked.
    pub cooldown_remaining_ms: i64,
    pub quiz: Option<QuizPosition>,
    pub quiz_result: Option<QuizResult>,
    pub failure: Option<FailureReason>,
    pub can_start: bool,
    pub can_finish_reading: bool,
    pub can_next: bool,
    pub can_previous: bool,
    pub can_submit: bool,
    pub can_retry: bool,
}

impl SessionSnapshot {
    /// `M:SS` for the reading countdown.
    #[must_use]
    pub fn countdown_display(&self) -> Option<String> {
        self.remaining_ms.map(format_countdown)
    }

    /// `H:MM:SS` or `M:SS` for the lockout, while locked.
    #[must_use]
    pub fn cooldown_display(&self) -> Option<String> {
        (self.state == SessionState::Locked).then(|| format_remaining(self.cooldown_remaining_ms))
    }
}
