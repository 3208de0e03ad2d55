//! Hard reading deadline for time-boxed lessons.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ProgressPercent;
use crate::progress::timed_progress;
use crate::time::Ticker;

/// Remaining time at or below which the countdown is shown as a warning.
pub const WARNING_THRESHOLD_MS: i64 = 60_000;
/// Remaining time at or below which the countdown is shown as critical.
pub const CRITICAL_THRESHOLD_MS: i64 = 30_000;

/// Display emphasis for the countdown. Presentation only; no timing logic reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownLevel {
    Normal,
    Warning,
    Critical,
}

impl CountdownLevel {
    #[must_use]
    pub fn for_remaining_ms(remaining_ms: i64) -> Self {
        if remaining_ms <= CRITICAL_THRESHOLD_MS {
            Self::Critical
        } else if remaining_ms <= WARNING_THRESHOLD_MS {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    pub remaining_ms: i64,
    pub level: CountdownLevel,
    /// True on the single tick that first observed zero.
    pub expired: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    budget: Duration,
    deadline: DateTime<Utc>,
    remaining_ms: i64,
    expired: bool,
    ticker: Ticker,
}

impl Countdown {
    #[must_use]
    pub fn start(budget: Duration, started_at: DateTime<Utc>, tick: Duration) -> Self {
        Self {
            budget,
            deadline: started_at + budget,
            remaining_ms: budget.num_milliseconds().max(0),
            expired: false,
            ticker: Ticker::new(tick, started_at),
        }
    }

    #[must_use]
    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    #[must_use]
    pub fn budget(&self) -> Duration {
        self.budget
    }

    #[must_use]
    pub fn remaining_ms(&self) -> i64 {
        self.remaining_ms
    }

    #[must_use]
    pub fn level(&self) -> CountdownLevel {
        CountdownLevel::for_remaining_ms(self.remaining_ms)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    #[must_use]
    pub fn progress(&self) -> ProgressPercent {
        timed_progress(self.budget, Duration::milliseconds(self.remaining_ms))
    }

    /// Recompute the remaining time against the deadline when the tick is due.
    ///
    /// Expiry is reported once; the countdown stops ticking afterwards.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<CountdownTick> {
        if self.expired || !self.ticker.poll(now) {
            return None;
        }
        self.remaining_ms = (self.deadline - now).num_milliseconds().max(0);
        let expired = self.remaining_ms == 0;
        if expired {
            self.expired = true;
            self.ticker.cancel();
        }
        Some(CountdownTick {
            remaining_ms: self.remaining_ms,
            level: self.level(),
            expired,
        })
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
    use crate::time::fixed_now;

    #[test]
    fn reaches_zero_after_exactly_budget_ticks() {
        let start = fixed_now();
        let mut countdown = Countdown::start(Duration::seconds(90), start, Duration::seconds(1));

        for second in 1..90_i64 {
            let tick = countdown.tick(start + Duration::seconds(second)).unwrap();
            assert_eq!(tick.remaining_ms, (90 - second) * 1_000);
            assert!(!tick.expired);
        }
        let last = countdown.tick(start + Duration::seconds(90)).unwrap();
        assert_eq!(last.remaining_ms, 0);
        assert!(last.expired);
    }

    #[test]
    fn expiry_fires_once_and_never_goes_negative() {
        let start = fixed_now();
        let mut countdown = Countdown::start(Duration::seconds(2), start, Duration::seconds(1));
        countdown.tick(start + Duration::seconds(1));
        let expired = countdown.tick(start + Duration::seconds(5)).unwrap();
        assert!(expired.expired);
        assert_eq!(expired.remaining_ms, 0);

        assert_eq!(countdown.tick(start + Duration::seconds(6)), None);
        assert_eq!(countdown.remaining_ms(), 0);
        assert!(countdown.is_expired());
    }

    #[test]
    fn levels_follow_thresholds() {
        assert_eq!(CountdownLevel::for_remaining_ms(61_000), CountdownLevel::Normal);
        assert_eq!(CountdownLevel::for_remaining_ms(60_000), CountdownLevel::Warning);
        assert_eq!(CountdownLevel::for_remaining_ms(31_000), CountdownLevel::Warning);
        assert_eq!(CountdownLevel::for_remaining_ms(30_000), CountdownLevel::Critical);
        assert_eq!(CountdownLevel::for_remaining_ms(0), CountdownLevel::Critical);
    }

    #[test]
    fn cancelled_countdown_is_silent() {
        let start = fixed_now();
        let mut countdown = Countdown::start(Duration::seconds(10), start, Duration::seconds(1));
        countdown.cancel();
        assert_eq!(countdown.tick(start + Duration::seconds(3)), None);
        assert_eq!(countdown.remaining_ms(), 10_000);
    }

    #[test]
    fn progress_is_spent_share_of_budget() {
        let start = fixed_now();
        let mut countdown = Countdown::start(Duration::seconds(100), start, Duration::seconds(1));
        for second in 1..=25_i64 {
            countdown.tick(start + Duration::seconds(second));
        }
        assert_eq!(countdown.progress().value(), 25);
    }
}
