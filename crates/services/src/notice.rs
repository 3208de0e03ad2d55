//! User-visible, non-blocking notifications produced by the engine.

use std::fmt;

use lesson_core::display::format_remaining;

/// Which collaborator call a sync notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Progress,
    Start,
    Complete,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncAction::Progress => "progress",
            SyncAction::Start => "start",
            SyncAction::Complete => "completion",
        };
        f.write_str(label)
    }
}

/// Why an attempt ended without a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailureReason {
    /// The reading deadline passed and there was no quiz to take.
    TimeExpired,
    /// The quiz score stayed below the pass threshold.
    LowScore { score_percent: f64 },
    /// The trainee left a time-boxed or video lesson mid-reading.
    Abandoned,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::TimeExpired => f.write_str("time ran out before the lesson was finished"),
            FailureReason::LowScore { score_percent } => {
                write!(f, "quiz score {score_percent:.0}% is below the pass mark")
            }
            FailureReason::Abandoned => f.write_str("the lesson was left before it was finished"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Progress of exactly 100 was acknowledged by the lesson service.
    ProgressSaved,
    SyncFailed { action: SyncAction, message: String },
    /// Lesson completed without a quiz.
    LessonCompleted,
    QuizPassed { score_percent: f64 },
    LessonFailed { reason: FailureReason },
    /// The lock is on; `remaining_ms` is shown as a live countdown.
    LessonLocked { remaining_ms: i64 },
    LockoutCleared,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ProgressSaved => f.write_str("Progress saved"),
            Notice::SyncFailed { action, message } => {
                write!(f, "Could not sync {action}: {message}")
            }
            Notice::LessonCompleted => f.write_str("Lesson completed"),
            Notice::QuizPassed { score_percent } => {
                write!(f, "Quiz passed with {score_percent:.0}%")
            }
            Notice::LessonFailed { reason } => write!(f, "Lesson failed: {reason}"),
            Notice::LessonLocked { remaining_ms } => write!(
                f,
                "Lesson locked, available again in {}",
                format_remaining(*remaining_ms)
            ),
            Notice::LockoutCleared => f.write_str("Lesson unlocked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_notice_names_the_reason() {
        let notice = Notice::LessonFailed {
            reason: FailureReason::LowScore { score_percent: 50.0 },
        };
        assert_eq!(
            notice.to_string(),
            "Lesson failed: quiz score 50% is below the pass mark"
        );
    }

    #[test]
    fn lock_notice_formats_remaining_time() {
        let notice = Notice::LessonLocked {
            remaining_ms: 3_600_000,
        };
        assert_eq!(notice.to_string(), "Lesson locked, available again in 1:00:00");
    }
}
