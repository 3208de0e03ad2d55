use chrono::{DateTime, Duration, Utc};

use crate::model::ids::LessonId;

/// Durable lockout for one lesson; the lesson may not be started before `locked_until`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownRecord {
    pub lesson_id: LessonId,
    pub locked_until: DateTime<Utc>,
}

impl CooldownRecord {
    #[must_use]
    pub fn starting_at(lesson_id: LessonId, now: DateTime<Utc>, lockout: Duration) -> Self {
        Self {
            lesson_id,
            locked_until: now + lockout,
        }
    }

    /// Rehydrate from a persisted epoch-milliseconds timestamp.
    #[must_use]
    pub fn from_millis(lesson_id: LessonId, locked_until_ms: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp_millis(locked_until_ms).map(|locked_until| Self {
            lesson_id,
            locked_until,
        })
    }

    #[must_use]
    pub fn locked_until_ms(&self) -> i64 {
        self.locked_until.timestamp_millis()
    }

    /// Time left on the lock, never negative.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.locked_until - now).max(Duration::zero())
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now).is_zero()
    }
}
