use chrono::{DateTime, Utc};
use lesson_core::countdown::{Countdown, CountdownTick};
use lesson_core::model::{EngineSettings, LessonContent, ProgressPercent};
use lesson_core::progress::ProgressEstimator;

/// The single timer running during `Reading`.
///
/// Time-boxed lessons run the countdown, all others the progress estimator;
/// never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveTimer {
    Progress(ProgressEstimator),
    Countdown(Countdown),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    Progress {
        percent: ProgressPercent,
        elapsed_secs: u32,
    },
    Countdown {
        tick: CountdownTick,
        percent: ProgressPercent,
    },
}

impl ActiveTimer {
    #[must_use]
    pub fn for_lesson(
        lesson: &LessonContent,
        settings: &EngineSettings,
        started_at: DateTime<Utc>,
    ) -> Self {
        match lesson.time_budget() {
            Some(budget) => Self::Countdown(Countdown::start(
                budget,
                started_at,
                settings.countdown_tick(),
            )),
            None => Self::Progress(ProgressEstimator::new(lesson, settings, started_at)),
        }
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<TimerTick> {
        match self {
            ActiveTimer::Progress(estimator) => {
                estimator.tick(now).map(|percent| TimerTick::Progress {
                    percent,
                    elapsed_secs: estimator.elapsed_secs(),
                })
            }
            ActiveTimer::Countdown(countdown) => countdown.tick(now).map(|tick| TimerTick::Countdown {
                tick,
                percent: countdown.progress(),
            }),
        }
    }

    pub fn cancel(&mut self) {
        match self {
            ActiveTimer::Progress(estimator) => estimator.cancel(),
            ActiveTimer::Countdown(countdown) => countdown.cancel(),
        }
    }

    #[must_use]
    pub fn remaining_ms(&self) -> Option<i64> {
        match self {
            ActiveTimer::Progress(_) => None,
            ActiveTimer::Countdown(countdown) => Some(countdown.remaining_ms()),
        }
    }

    #[must_use]
    pub fn is_countdown(&self) -> bool {
        matches!(self, ActiveTimer::Countdown(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use lesson_core::model::{LessonDraft, LessonId};
    use lesson_core::time::fixed_now;

    fn lesson(budget: Option<u32>) -> LessonContent {
        LessonDraft {
            id: LessonId::new(1),
            title: "Call openings".into(),
            text_body: Some("Greet the caller by name.".into()),
            time_budget_minutes: budget,
            ..LessonDraft::default()
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn time_boxed_lesson_gets_countdown() {
        let timer = ActiveTimer::for_lesson(&lesson(Some(10)), &EngineSettings::default(), fixed_now());
        assert!(timer.is_countdown());
        assert_eq!(timer.remaining_ms(), Some(600_000));
    }

    #[test]
    fn untimed_lesson_gets_estimator() {
        let mut timer = ActiveTimer::for_lesson(&lesson(None), &EngineSettings::default(), fixed_now());
        assert!(!timer.is_countdown());
        assert_eq!(timer.remaining_ms(), None);

        let tick = timer.tick(fixed_now() + Duration::seconds(10)).unwrap();
        assert_eq!(
            tick,
            TimerTick::Progress {
                percent: ProgressPercent::clamped(3),
                elapsed_secs: 10
            }
        );
    }

    #[test]
    fn cancelled_timer_stops() {
        let mut timer = ActiveTimer::for_lesson(&lesson(Some(1)), &EngineSettings::default(), fixed_now());
        timer.cancel();
        assert_eq!(timer.tick(fixed_now() + Duration::seconds(1)), None);
    }
}
