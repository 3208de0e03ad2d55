use std::sync::Arc;

use chrono::Duration;
use lesson_core::display::format_remaining;
use lesson_core::model::{CooldownRecord, EngineSettings, LessonId};
use storage::repository::CooldownStore;

use crate::Clock;
use crate::error::CooldownError;

/// Remaining lockout for a lesson at the moment it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutStatus {
    pub lesson_id: LessonId,
    pub remaining_ms: i64,
}

impl LockoutStatus {
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.remaining_ms > 0
    }

    /// `H:MM:SS` from one hour up, `M:SS` below.
    #[must_use]
    pub fn display(&self) -> String {
        format_remaining(self.remaining_ms)
    }
}

/// Per-lesson lockout window, durable across reloads through a `CooldownStore`.
#[derive(Clone)]
pub struct CooldownService {
    clock: Clock,
    store: Arc<dyn CooldownStore>,
    lockout: Duration,
}

impl CooldownService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn CooldownStore>) -> Self {
        Self {
            clock,
            store,
            lockout: EngineSettings::default().lockout(),
        }
    }

    #[must_use]
    pub fn with_lockout(mut self, lockout: Duration) -> Self {
        self.lockout = lockout;
        self
    }

    #[must_use]
    pub fn lockout(&self) -> Duration {
        self.lockout
    }

    /// Lock the lesson for the configured window starting now.
    ///
    /// # Errors
    ///
    /// Returns `CooldownError::Storage` if the record cannot be written.
    pub async fn start_lockout(&self, lesson_id: LessonId) -> Result<CooldownRecord, CooldownError> {
        let record = CooldownRecord::starting_at(lesson_id, self.clock.now(), self.lockout);
        self.store.set(&record).await?;
        tracing::info!(
            %lesson_id,
            locked_until = %record.locked_until,
            "lesson locked"
        );
        Ok(record)
    }

    /// Time left on the lesson's lock. An expired record is deleted on read.
    ///
    /// # Errors
    ///
    /// Returns `CooldownError::Storage` if the store cannot be read or cleaned.
    pub async fn remaining(&self, lesson_id: LessonId) -> Result<Duration, CooldownError> {
        let Some(record) = self.store.get(lesson_id).await? else {
            return Ok(Duration::zero());
        };
        let remaining = record.remaining(self.clock.now());
        if remaining.is_zero() {
            self.store.delete(lesson_id).await?;
            tracing::debug!(%lesson_id, "expired lock removed");
        }
        Ok(remaining)
    }

    /// # Errors
    ///
    /// Returns `CooldownError::Storage` if the store cannot be read or cleaned.
    pub async fn status(&self, lesson_id: LessonId) -> Result<LockoutStatus, CooldownError> {
        let remaining = self.remaining(lesson_id).await?;
        Ok(LockoutStatus {
            lesson_id,
            remaining_ms: remaining.num_milliseconds().max(0),
        })
    }
}
