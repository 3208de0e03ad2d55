use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
    /// Shared clock that every holder observes advancing together.
    Manual(ManualClock),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns a clock driven by the given manual handle.
    #[must_use]
    pub fn manual(handle: ManualClock) -> Self {
        Self::Manual(handle)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
            Clock::Manual(handle) => handle.now(),
        }
    }

    /// Advance a fixed or manual clock by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        match self {
            Clock::Default => {}
            Clock::Fixed(t) => *t += delta,
            Clock::Manual(handle) => handle.advance(delta),
        }
    }

    /// Returns true if this clock represents real time.
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self, Clock::Default)
    }
}

/// Cloneable handle to a manually advanced instant.
///
/// Every clone observes the same instant, so a test can keep one handle and
/// pass `Clock::manual(handle.clone())` into the components under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn advance(&self, delta: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += delta;
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }
}

//
// ─── TICKER ────────────────────────────────────────────────────────────────────
//

/// Periodic schedule polled against a clock, with cancellation.
///
/// A poll fires at most once. Periods missed while nobody polled are not
/// replayed, so the number of fires tracks active time rather than wall time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticker {
    period: Duration,
    next_due: DateTime<Utc>,
    cancelled: bool,
}

impl Ticker {
    /// Schedule the first fire one `period` after `started_at`.
    #[must_use]
    pub fn new(period: Duration, started_at: DateTime<Utc>) -> Self {
        Self {
            period,
            next_due: started_at + period,
            cancelled: false,
        }
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[must_use]
    pub fn next_due(&self) -> DateTime<Utc> {
        self.next_due
    }

    /// Returns true when the schedule fires at `now`.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        if self.cancelled || now < self.next_due {
            return false;
        }
        self.next_due += self.period;
        if self.next_due <= now {
            self.next_due = now + self.period;
        }
        true
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

/// Returns a shared manual clock starting at the deterministic test timestamp.
#[must_use]
pub fn manual_clock() -> ManualClock {
    ManualClock::new(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let handle = manual_clock();
        let clock = Clock::manual(handle.clone());
        handle.advance(Duration::seconds(5));
        assert_eq!(clock.now(), fixed_now() + Duration::seconds(5));
    }

    #[test]
    fn fixed_clock_advances_in_place() {
        let mut clock = fixed_clock();
        clock.advance(Duration::minutes(1));
        assert_eq!(clock.now(), fixed_now() + Duration::minutes(1));
    }

    #[test]
    fn ticker_fires_once_per_period() {
        let start = fixed_now();
        let mut ticker = Ticker::new(Duration::seconds(10), start);

        assert!(!ticker.poll(start + Duration::seconds(9)));
        assert!(ticker.poll(start + Duration::seconds(10)));
        assert!(!ticker.poll(start + Duration::seconds(15)));
        assert!(ticker.poll(start + Duration::seconds(20)));
    }

    #[test]
    fn ticker_does_not_replay_missed_periods() {
        let start = fixed_now();
        let mut ticker = Ticker::new(Duration::seconds(10), start);

        assert!(ticker.poll(start + Duration::seconds(95)));
        assert!(!ticker.poll(start + Duration::seconds(96)));
        assert_eq!(ticker.next_due(), start + Duration::seconds(105));
    }

    #[test]
    fn cancelled_ticker_never_fires() {
        let start = fixed_now();
        let mut ticker = Ticker::new(Duration::seconds(1), start);
        ticker.cancel();
        assert!(!ticker.poll(start + Duration::seconds(60)));
        assert!(ticker.is_cancelled());
    }
}
