use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use lesson_core::model::{LessonId, ProgressPercent};

use super::api::LessonApi;
use crate::error::SyncError;
use crate::notice::{Notice, SyncAction};

/// Trailing-edge debounce for progress values.
///
/// Each push replaces the pending value and restarts the window; the latest
/// value is released once the window passes without a newer push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressDebounce {
    window: Duration,
    pending: Option<(ProgressPercent, DateTime<Utc>)>,
}

impl ProgressDebounce {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn push(&mut self, percent: ProgressPercent, now: DateTime<Utc>) {
        self.pending = Some((percent, now + self.window));
    }

    #[must_use]
    pub fn pending(&self) -> Option<ProgressPercent> {
        self.pending.map(|(percent, _)| percent)
    }

    /// Take the pending value if its window has elapsed at `now`.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Option<ProgressPercent> {
        match self.pending {
            Some((percent, due_at)) if now >= due_at => {
                self.pending = None;
                Some(percent)
            }
            _ => None,
        }
    }

    /// Drop the pending value. Returns whether one was waiting.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    NotRequested,
    /// Requested but not yet acknowledged; re-sent at the next opportunity.
    Pending,
    Acknowledged,
}

/// Forwards one lesson's progress, start, and completion to the lesson service.
///
/// Progress is debounced; start and completion are sent immediately and awaited.
/// Failures never propagate: they are logged and queued as notices.
pub struct SyncGateway {
    api: Arc<dyn LessonApi>,
    lesson_id: LessonId,
    debounce: ProgressDebounce,
    completion: Completion,
    notices: Vec<Notice>,
}

impl SyncGateway {
    #[must_use]
    pub fn new(api: Arc<dyn LessonApi>, lesson_id: LessonId, window: Duration) -> Self {
        Self {
            api,
            lesson_id,
            debounce: ProgressDebounce::new(window),
            completion: Completion::NotRequested,
            notices: Vec::new(),
        }
    }

    #[must_use]
    pub fn pending_progress(&self) -> Option<ProgressPercent> {
        self.debounce.pending()
    }

    #[must_use]
    pub fn completion_pending(&self) -> bool {
        self.completion == Completion::Pending
    }

    #[must_use]
    pub fn completion_acknowledged(&self) -> bool {
        self.completion == Completion::Acknowledged
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Queue a progress value behind the debounce window.
    pub fn queue_progress(&mut self, percent: ProgressPercent, now: DateTime<Utc>) {
        tracing::trace!(lesson_id = %self.lesson_id, percent = percent.value(), "queued progress");
        self.debounce.push(percent, now);
    }

    /// Send whatever is due at `now`: debounced progress and any completion
    /// that failed earlier.
    pub async fn poll(&mut self, now: DateTime<Utc>) {
        if let Some(percent) = self.debounce.take_due(now) {
            self.send_progress(percent).await;
        }
        if self.completion == Completion::Pending {
            self.send_complete().await;
        }
    }

    /// Replace anything pending with `percent` and send it now.
    pub async fn send_progress_now(&mut self, percent: ProgressPercent) {
        self.debounce.cancel();
        self.send_progress(percent).await;
    }

    /// Drop any pending progress without sending it.
    pub fn cancel(&mut self) {
        if self.debounce.cancel() {
            tracing::debug!(lesson_id = %self.lesson_id, "dropped pending progress");
        }
    }

    /// Returns true when the service acknowledged the start.
    pub async fn report_start(&mut self) -> bool {
        let result = self.api.report_start(self.lesson_id).await;
        self.record(SyncAction::Start, result)
    }

    /// Send the completion once. A failed send stays pending for [`SyncGateway::poll`]
    /// or [`SyncGateway::retry_completion`].
    pub async fn report_complete(&mut self) -> bool {
        match self.completion {
            Completion::Acknowledged => true,
            Completion::NotRequested | Completion::Pending => self.send_complete().await,
        }
    }

    /// Re-send a completion that has not been acknowledged yet.
    pub async fn retry_completion(&mut self) -> bool {
        match self.completion {
            Completion::Pending => self.send_complete().await,
            Completion::Acknowledged => true,
            Completion::NotRequested => false,
        }
    }

    async fn send_complete(&mut self) -> bool {
        let result = self.api.report_complete(self.lesson_id).await;
        let ok = self.record(SyncAction::Complete, result);
        self.completion = if ok {
            Completion::Acknowledged
        } else {
            Completion::Pending
        };
        ok
    }

    async fn send_progress(&mut self, percent: ProgressPercent) {
        let result = self.api.report_progress(self.lesson_id, percent).await;
        if self.record(SyncAction::Progress, result) && percent.is_full() {
            self.notices.push(Notice::ProgressSaved);
        }
    }

    fn record(&mut self, action: SyncAction, result: Result<(), SyncError>) -> bool {
        match result {
            Ok(()) => {
                tracing::debug!(lesson_id = %self.lesson_id, %action, "synced");
                true
            }
            Err(err) => {
                tracing::warn!(lesson_id = %self.lesson_id, %action, %err, "sync failed");
                self.notices.push(Notice::SyncFailed {
                    action,
                    message: err.to_string(),
                });
                false
            }
        }
    }
}
