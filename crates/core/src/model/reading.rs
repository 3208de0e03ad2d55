use chrono::{DateTime, Utc};

use crate::model::percent::ProgressPercent;

/// In-process state of the reading phase of one attempt.
///
/// Progress only moves forward, except through [`ReadingSession::reset_progress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingSession {
    started_at: DateTime<Utc>,
    has_started_reading: bool,
    has_finished_reading: bool,
    progress: ProgressPercent,
    elapsed_secs: u32,
}

impl ReadingSession {
    #[must_use]
    pub fn start(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            has_started_reading: true,
            has_finished_reading: false,
            progress: ProgressPercent::ZERO,
            elapsed_secs: 0,
        }
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn has_started_reading(&self) -> bool {
        self.has_started_reading
    }

    #[must_use]
    pub fn has_finished_reading(&self) -> bool {
        self.has_finished_reading
    }

    #[must_use]
    pub fn progress(&self) -> ProgressPercent {
        self.progress
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    /// Raise progress to `progress`; lower values are ignored.
    pub fn advance_progress(&mut self, progress: ProgressPercent) -> ProgressPercent {
        self.progress = self.progress.max(progress);
        self.progress
    }

    pub fn set_elapsed_secs(&mut self, elapsed_secs: u32) {
        self.elapsed_secs = self.elapsed_secs.max(elapsed_secs);
    }

    pub fn mark_finished(&mut self) {
        self.has_finished_reading = true;
        self.progress = ProgressPercent::FULL;
    }

    /// Forced reset after expiry or abandonment.
    pub fn reset_progress(&mut self) {
        self.progress = ProgressPercent::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn progress_never_moves_backwards() {
        let mut reading = ReadingSession::start(fixed_now());
        reading.advance_progress(ProgressPercent::clamped(40));
        reading.advance_progress(ProgressPercent::clamped(30));
        assert_eq!(reading.progress().value(), 40);
    }

    #[test]
    fn reset_is_the_only_way_down() {
        let mut reading = ReadingSession::start(fixed_now());
        reading.advance_progress(ProgressPercent::clamped(80));
        reading.reset_progress();
        assert_eq!(reading.progress(), ProgressPercent::ZERO);
        assert!(!reading.has_finished_reading());
    }

    #[test]
    fn finishing_sets_full_progress() {
        let mut reading = ReadingSession::start(fixed_now());
        reading.mark_finished();
        assert!(reading.has_finished_reading());
        assert!(reading.progress().is_full());
    }
}
