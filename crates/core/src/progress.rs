//! Reading-progress estimation for untimed lessons.

use chrono::{DateTime, Duration, Utc};

use crate::model::{EngineSettings, LessonContent, ProgressPercent};
use crate::time::Ticker;

/// Expected reading time for a lesson, in seconds.
///
/// Time-boxed lessons use their budget. Otherwise the text is read at
/// `words_per_minute` (whole minutes, rounded up) with `min_reading_secs` as
/// the floor; a lesson without text falls back to `default_reading_secs`.
#[must_use]
pub fn expected_reading_secs(lesson: &LessonContent, settings: &EngineSettings) -> u32 {
    if let Some(minutes) = lesson.time_budget_minutes() {
        return minutes.saturating_mul(60);
    }
    if lesson.text_body().is_none() {
        return settings.default_reading_secs();
    }
    let words = u32::try_from(lesson.word_count()).unwrap_or(u32::MAX);
    let minutes = words.div_ceil(settings.words_per_minute());
    minutes
        .saturating_mul(60)
        .max(settings.min_reading_secs())
}

/// Progress of a time-boxed lesson from its countdown: `(budget - remaining) / budget`.
#[must_use]
pub fn timed_progress(budget: Duration, remaining: Duration) -> ProgressPercent {
    let budget_ms = budget.num_milliseconds().max(0);
    let remaining_ms = remaining.num_milliseconds().clamp(0, budget_ms);
    let spent = u64::try_from(budget_ms - remaining_ms).unwrap_or(0);
    let whole = u64::try_from(budget_ms).unwrap_or(0);
    ProgressPercent::from_ratio(spent, whole)
}

/// Accumulates active reading time in fixed steps and maps it to a percentage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEstimator {
    total_secs: u32,
    elapsed_secs: u32,
    step_secs: u32,
    ticker: Ticker,
}

impl ProgressEstimator {
    #[must_use]
    pub fn new(lesson: &LessonContent, settings: &EngineSettings, started_at: DateTime<Utc>) -> Self {
        Self::with_total(
            expected_reading_secs(lesson, settings),
            settings.progress_tick_secs(),
            started_at,
        )
    }

    #[must_use]
    pub fn with_total(total_secs: u32, step_secs: u32, started_at: DateTime<Utc>) -> Self {
        Self {
            total_secs,
            elapsed_secs: 0,
            step_secs,
            ticker: Ticker::new(Duration::seconds(i64::from(step_secs)), started_at),
        }
    }

    #[must_use]
    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    #[must_use]
    pub fn progress(&self) -> ProgressPercent {
        ProgressPercent::from_ratio(u64::from(self.elapsed_secs), u64::from(self.total_secs))
    }

    /// Account one step if the step ticker is due, returning the new progress.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<ProgressPercent> {
        if !self.ticker.poll(now) {
            return None;
        }
        self.elapsed_secs = self
            .elapsed_secs
            .saturating_add(self.step_secs)
            .min(self.total_secs);
        Some(self.progress())
    }

    pub fn cancel(&mut self) {
        self.ticker.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.ticker.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LessonDraft, LessonId};
    use crate::time::fixed_now;

    fn lesson_with_words(words: usize, budget: Option<u32>) -> LessonContent {
        let text = if words == 0 {
            None
        } else {
            Some(vec!["word"; words].join(" "))
        };
        LessonDraft {
            id: LessonId::new(1),
            title: "Lesson".into(),
            text_body: text,
            time_budget_minutes: budget,
            ..LessonDraft::default()
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn short_text_is_floored_at_minimum() {
        let settings = EngineSettings::default();
        assert_eq!(expected_reading_secs(&lesson_with_words(100, None), &settings), 300);
    }

    #[test]
    fn long_text_rounds_up_to_whole_minutes() {
        let settings = EngineSettings::default();
        // 1_501 words at 250 wpm is 6.004 minutes, so 7 minutes.
        assert_eq!(expected_reading_secs(&lesson_with_words(1_501, None), &settings), 420);
    }

    #[test]
    fn missing_text_uses_default() {
        let settings = EngineSettings::default();
        assert_eq!(expected_reading_secs(&lesson_with_words(0, None), &settings), 300);
    }

    #[test]
    fn budget_wins_over_text() {
        let settings = EngineSettings::default();
        assert_eq!(expected_reading_secs(&lesson_with_words(5_000, Some(10)), &settings), 600);
    }

    #[test]
    fn reaches_full_exactly_at_total() {
        let start = fixed_now();
        let mut estimator = ProgressEstimator::with_total(300, 10, start);

        let mut last = ProgressPercent::ZERO;
        for step in 1..=30_i64 {
            let now = start + Duration::seconds(step * 10);
            last = estimator.tick(now).expect("step due");
            if step < 30 {
                assert!(!last.is_full(), "full too early at step {step}");
            }
        }
        assert!(last.is_full());
        assert_eq!(estimator.elapsed_secs(), 300);
    }

    #[test]
    fn ticks_between_steps_do_nothing() {
        let start = fixed_now();
        let mut estimator = ProgressEstimator::with_total(300, 10, start);
        assert_eq!(estimator.tick(start + Duration::seconds(5)), None);
        assert_eq!(estimator.elapsed_secs(), 0);
    }

    #[test]
    fn cancelled_estimator_stops_accumulating() {
        let start = fixed_now();
        let mut estimator = ProgressEstimator::with_total(300, 10, start);
        estimator.cancel();
        assert_eq!(estimator.tick(start + Duration::seconds(10)), None);
    }

    #[test]
    fn timed_progress_tracks_spent_budget() {
        let budget = Duration::minutes(10);
        assert_eq!(timed_progress(budget, budget), ProgressPercent::ZERO);
        assert_eq!(timed_progress(budget, Duration::minutes(5)).value(), 50);
        assert_eq!(timed_progress(budget, Duration::zero()), ProgressPercent::FULL);
        assert_eq!(timed_progress(budget, Duration::seconds(-3)), ProgressPercent::FULL);
    }
}
