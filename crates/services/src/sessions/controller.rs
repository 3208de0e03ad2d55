use std::sync::Arc;

use chrono::{DateTime, Utc};
use lesson_core::countdown::CountdownLevel;
use lesson_core::model::{
    EngineSettings, LessonContent, ProgressPercent, QuizAttempt, QuizResult, ReadingSession,
    SessionId,
};

use super::state::{Phase, SessionEvent, SessionState};
use super::timer::{ActiveTimer, TimerTick};
use super::view::{QuizPosition, SessionSnapshot};
use crate::Clock;
use crate::cooldown_service::CooldownService;
use crate::error::SessionError;
use crate::notice::{FailureReason, Notice};
use crate::sync::{LessonApi, SyncGateway};

fn invalid(action: &'static str, state: SessionState) -> SessionError {
    SessionError::InvalidTransition { action, state }
}

/// Drives one trainee through one lesson: reading, quiz, and lockout.
///
/// Time is pulled: the host calls [`SessionController::tick`] on a short
/// interval and the controller polls its own timers and the sync debounce
/// against the clock. Nothing runs once the session is left.
pub struct SessionController {
    session_id: SessionId,
    lesson: Arc<LessonContent>,
    settings: EngineSettings,
    clock: Clock,
    sync: SyncGateway,
    cooldowns: CooldownService,
    phase: Phase,
    progress: ProgressPercent,
    notices: Vec<Notice>,
    events: Vec<SessionEvent>,
}

impl SessionController {
    #[must_use]
    pub fn new(
        lesson: Arc<LessonContent>,
        settings: EngineSettings,
        clock: Clock,
        api: Arc<dyn LessonApi>,
        cooldowns: CooldownService,
    ) -> Self {
        let sync = SyncGateway::new(api, lesson.id(), settings.sync_debounce());
        let cooldowns = cooldowns.with_lockout(settings.lockout());
        Self {
            session_id: SessionId::new_v4(),
            lesson,
            settings,
            clock,
            sync,
            cooldowns,
            phase: Phase::NotStarted,
            progress: ProgressPercent::ZERO,
            notices: Vec::new(),
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn lesson(&self) -> &LessonContent {
        &self.lesson
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.phase.state()
    }

    #[must_use]
    pub fn progress(&self) -> ProgressPercent {
        self.progress
    }

    /// Countdown of a time-boxed lesson while reading.
    #[must_use]
    pub fn remaining_ms(&self) -> Option<i64> {
        match &self.phase {
            Phase::Reading { timer, .. } => timer.remaining_ms(),
            _ => None,
        }
    }

    #[must_use]
    pub fn cooldown_remaining_ms(&self) -> i64 {
        match self.phase {
            Phase::Locked { remaining_ms } => remaining_ms,
            _ => 0,
        }
    }

    #[must_use]
    pub fn quiz_result(&self) -> Option<QuizResult> {
        match &self.phase {
            Phase::Questioning { attempt } => attempt.result(),
            Phase::Passed { result } | Phase::Failed { result, .. } => *result,
            _ => None,
        }
    }

    #[must_use]
    pub fn can_start(&self) -> bool {
        matches!(self.phase, Phase::NotStarted)
    }

    #[must_use]
    pub fn can_finish_reading(&self) -> bool {
        matches!(self.phase, Phase::Reading { .. })
    }

    #[must_use]
    pub fn can_next(&self) -> bool {
        matches!(&self.phase, Phase::Questioning { attempt } if attempt.can_go_next())
    }

    #[must_use]
    pub fn can_previous(&self) -> bool {
        matches!(&self.phase, Phase::Questioning { attempt } if attempt.can_go_previous())
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        matches!(&self.phase, Phase::Questioning { attempt } if attempt.can_submit())
    }

    #[must_use]
    pub fn can_retry(&self) -> bool {
        matches!(self.phase, Phase::Failed { .. })
    }

    /// Notices produced since the last drain, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.absorb_sync_notices();
        std::mem::take(&mut self.notices)
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let remaining_ms = self.remaining_ms();
        let quiz = match &self.phase {
            Phase::Questioning { attempt } => Some(QuizPosition {
                current_index: attempt.current_index(),
                question_count: attempt.question_count(),
                selected: attempt.selected(attempt.current_index()),
                unanswered: attempt.unanswered(),
            }),
            _ => None,
        };
        let failure = match &self.phase {
            Phase::Failed { reason, .. } => Some(*reason),
            _ => None,
        };
        SessionSnapshot {
            session_id: self.session_id,
            lesson_id: self.lesson.id(),
            state: self.state(),
            progress_percent: self.progress,
            remaining_ms,
            countdown_level: remaining_ms.map(CountdownLevel::for_remaining_ms),
            cooldown_remaining_ms: self.cooldown_remaining_ms(),
            quiz,
            quiz_result: self.quiz_result(),
            failure,
            can_start: self.can_start(),
            can_finish_reading: self.can_finish_reading(),
            can_next: self.can_next(),
            can_previous: self.can_previous(),
            can_submit: self.can_submit(),
            can_retry: self.can_retry(),
        }
    }

    //
    // ─── LOCK ──────────────────────────────────────────────────────────────────
    //

    /// Re-read the lesson's lock while the session has not started.
    ///
    /// Enters `Locked` while a lock is on and returns to `NotStarted` once it
    /// has run out. Other states are left alone.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Disposed` after [`SessionController::leave`] and
    /// `SessionError::Cooldown` if the lock store cannot be read.
    pub async fn check_lock(&mut self) -> Result<SessionState, SessionError> {
        self.ensure_live()?;
        let was_locked = match self.phase {
            Phase::Locked { .. } => true,
            Phase::NotStarted => false,
            _ => return Ok(self.state()),
        };

        let status = self.cooldowns.status(self.lesson.id()).await?;
        if status.is_locked() {
            self.enter(Phase::Locked {
                remaining_ms: status.remaining_ms,
            });
        } else if was_locked {
            tracing::info!(session_id = %self.session_id, lesson_id = %self.lesson.id(), "lockout cleared");
            self.notify(Notice::LockoutCleared);
            self.enter(Phase::NotStarted);
        }
        Ok(self.state())
    }

    //
    // ─── READING ───────────────────────────────────────────────────────────────
    //

    /// Begin reading, unless the lesson is locked.
    ///
    /// The start is reported to the lesson service and awaited; a failed report
    /// becomes a notice and reading starts anyway.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `NotStarted`/`Locked`,
    /// `SessionError::Disposed` after leave, and `SessionError::Cooldown` if
    /// the lock store cannot be read.
    pub async fn start(&mut self) -> Result<SessionState, SessionError> {
        self.ensure_live()?;
        if !matches!(self.phase, Phase::NotStarted | Phase::Locked { .. }) {
            return Err(invalid("start", self.state()));
        }

        if self.check_lock().await? == SessionState::Locked {
            let remaining_ms = self.cooldown_remaining_ms();
            tracing::info!(session_id = %self.session_id, lesson_id = %self.lesson.id(), remaining_ms, "start refused, lesson locked");
            self.notify(Notice::LessonLocked { remaining_ms });
            return Ok(SessionState::Locked);
        }

        self.sync.report_start().await;
        self.absorb_sync_notices();

        let now = self.clock.now();
        let timer = ActiveTimer::for_lesson(&self.lesson, &self.settings, now);
        self.progress = ProgressPercent::ZERO;
        self.enter(Phase::Reading {
            reading: ReadingSession::start(now),
            timer,
        });
        Ok(SessionState::Reading)
    }

    /// The trainee is done reading.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Reading`.
    pub async fn finish_reading(&mut self) -> Result<SessionState, SessionError> {
        self.ensure_live()?;
        if !matches!(self.phase, Phase::Reading { .. }) {
            return Err(invalid("finish reading", self.state()));
        }
        self.finish_reading_now().await;
        Ok(self.state())
    }

    /// Advance timers and flush due sync work. Call about once per second.
    ///
    /// A disposed session ignores ticks.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Cooldown` if the lock store cannot be read while locked.
    pub async fn tick(&mut self) -> Result<SessionState, SessionError> {
        if matches!(self.phase, Phase::Disposed) {
            return Ok(SessionState::Disposed);
        }
        let now = self.clock.now();
        self.sync.poll(now).await;

        match self.phase {
            Phase::Locked { .. } => {
                self.check_lock().await?;
            }
            Phase::Reading { .. } => self.tick_reading(now).await,
            _ => {}
        }
        self.absorb_sync_notices();
        Ok(self.state())
    }

    async fn tick_reading(&mut self, now: DateTime<Utc>) {
        let Phase::Reading { reading, timer } = &mut self.phase else {
            return;
        };
        let Some(tick) = timer.tick(now) else {
            return;
        };

        match tick {
            TimerTick::Progress {
                percent,
                elapsed_secs,
            } => {
                reading.set_elapsed_secs(elapsed_secs);
                let progress = reading.advance_progress(percent);
                self.progress = progress;
                tracing::trace!(session_id = %self.session_id, percent = progress.value(), elapsed_secs, "reading progress");
                if progress.is_full() {
                    self.finish_reading_now().await;
                } else {
                    self.sync.queue_progress(progress, now);
                }
            }
            TimerTick::Countdown { tick, percent } => {
                tracing::trace!(session_id = %self.session_id, remaining_ms = tick.remaining_ms, "countdown");
                self.events.push(SessionEvent::Countdown {
                    remaining_ms: tick.remaining_ms,
                    level: tick.level,
                });
                if tick.expired {
                    self.expire().await;
                } else {
                    let progress = reading.advance_progress(percent);
                    self.progress = progress;
                    self.sync.queue_progress(progress, now);
                }
            }
        }
    }

    async fn finish_reading_now(&mut self) {
        if let Phase::Reading { reading, timer } = &mut self.phase {
            timer.cancel();
            reading.mark_finished();
        }
        self.progress = ProgressPercent::FULL;
        self.sync.send_progress_now(ProgressPercent::FULL).await;
        self.emit_transition(SessionState::Reading, SessionState::FinishedReading);
        self.after_reading(SessionState::FinishedReading).await;
    }

    async fn expire(&mut self) {
        if let Phase::Reading { reading, timer } = &mut self.phase {
            timer.cancel();
            reading.reset_progress();
        }
        tracing::info!(session_id = %self.session_id, lesson_id = %self.lesson.id(), "reading time expired");
        self.progress = ProgressPercent::ZERO;
        self.sync.send_progress_now(ProgressPercent::ZERO).await;
        self.emit_transition(SessionState::Reading, SessionState::Expired);
        self.after_reading(SessionState::Expired).await;
    }

    async fn after_reading(&mut self, from: SessionState) {
        match QuizAttempt::new(self.lesson.questions()) {
            Ok(attempt) => self.set_phase(from, Phase::Questioning { attempt }),
            Err(_) if from == SessionState::Expired => {
                let reason = FailureReason::TimeExpired;
                self.notify(Notice::LessonFailed { reason });
                self.set_phase(from, Phase::Failed { reason, result: None });
            }
            Err(_) => {
                self.sync.report_complete().await;
                self.notify(Notice::LessonCompleted);
                self.set_phase(from, Phase::Passed { result: None });
            }
        }
        self.absorb_sync_notices();
    }

    //
    // ─── QUIZ ──────────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Questioning` and
    /// `SessionError::Quiz` for out-of-range indices.
    pub fn select_answer(&mut self, question_index: usize, option_index: usize) -> Result<(), SessionError> {
        self.attempt_mut("select answer")?
            .select_answer(question_index, option_index)?;
        Ok(())
    }

    /// Move to the next question; returns the new index.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` when the current question is unanswered or
    /// already the last.
    pub fn next(&mut self) -> Result<usize, SessionError> {
        Ok(self.attempt_mut("next")?.next()?)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Quiz` at the first question.
    pub fn previous(&mut self) -> Result<usize, SessionError> {
        Ok(self.attempt_mut("previous")?.previous()?)
    }

    /// Score the quiz. A pass reports completion and locks the lesson; a
    /// failure does neither.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` while answers are missing and
    /// `SessionError::Cooldown` if the lock cannot be stored.
    pub async fn submit_quiz(&mut self) -> Result<QuizResult, SessionError> {
        let threshold = self.settings.pass_threshold_percent();
        let lesson = Arc::clone(&self.lesson);
        let result = self
            .attempt_mut("submit")?
            .submit(lesson.questions(), threshold)?;
        tracing::info!(
            session_id = %self.session_id,
            lesson_id = %lesson.id(),
            correct = result.correct_count,
            total = result.question_count,
            passed = result.passed,
            "quiz submitted"
        );

        if result.passed {
            self.sync.report_complete().await;
            self.notify(Notice::QuizPassed {
                score_percent: result.score_percent,
            });
            self.set_phase(
                SessionState::Questioning,
                Phase::Passed {
                    result: Some(result),
                },
            );
            self.cooldowns.start_lockout(lesson.id()).await?;
        } else {
            let reason = FailureReason::LowScore {
                score_percent: result.score_percent,
            };
            self.notify(Notice::LessonFailed { reason });
            self.set_phase(
                SessionState::Questioning,
                Phase::Failed {
                    reason,
                    result: Some(result),
                },
            );
        }
        Ok(result)
    }

    /// Return a failed session to `NotStarted` for a fresh attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Failed`.
    pub fn retry(&mut self) -> Result<SessionState, SessionError> {
        self.ensure_live()?;
        if !matches!(self.phase, Phase::Failed { .. }) {
            return Err(invalid("retry", self.state()));
        }
        self.progress = ProgressPercent::ZERO;
        self.enter(Phase::NotStarted);
        Ok(SessionState::NotStarted)
    }

    //
    // ─── LEAVE ─────────────────────────────────────────────────────────────────
    //

    /// Dispose the session. Idempotent.
    ///
    /// Leaving a time-boxed or video lesson mid-reading burns the attempt: 0%
    /// and completion are reported before the session is dropped. Otherwise
    /// pending progress is discarded and only an unacknowledged completion is
    /// re-sent.
    pub async fn leave(&mut self) {
        let from = self.state();
        let abandoned = match &mut self.phase {
            Phase::Disposed => return,
            Phase::Reading { reading, timer } => {
                timer.cancel();
                let burns_attempt = self.lesson.abandoning_counts_as_failure();
                if burns_attempt {
                    reading.reset_progress();
                }
                burns_attempt
            }
            _ => false,
        };

        if abandoned {
            tracing::info!(session_id = %self.session_id, lesson_id = %self.lesson.id(), "lesson abandoned");
            let reason = FailureReason::Abandoned;
            self.progress = ProgressPercent::ZERO;
            self.sync.send_progress_now(ProgressPercent::ZERO).await;
            self.sync.report_complete().await;
            self.notify(Notice::LessonFailed { reason });
            self.set_phase(from, Phase::Failed { reason, result: None });
        } else {
            self.sync.cancel();
            self.sync.retry_completion().await;
        }
        self.absorb_sync_notices();
        self.enter(Phase::Disposed);
    }

    //
    // ─── HELPERS ───────────────────────────────────────────────────────────────
    //

    fn ensure_live(&self) -> Result<(), SessionError> {
        if matches!(self.phase, Phase::Disposed) {
            return Err(SessionError::Disposed);
        }
        Ok(())
    }

    fn attempt_mut(&mut self, action: &'static str) -> Result<&mut QuizAttempt, SessionError> {
        let state = self.phase.state();
        match &mut self.phase {
            Phase::Questioning { attempt } => Ok(attempt),
            Phase::Disposed => Err(SessionError::Disposed),
            _ => Err(invalid(action, state)),
        }
    }

    fn absorb_sync_notices(&mut self) {
        let notices = self.sync.drain_notices();
        self.notices.extend(notices);
    }

    /// Queue a controller notice behind everything the sync gateway produced so far.
    fn notify(&mut self, notice: Notice) {
        self.absorb_sync_notices();
        self.notices.push(notice);
    }

    fn enter(&mut self, phase: Phase) {
        let from = self.phase.state();
        self.set_phase(from, phase);
    }

    fn set_phase(&mut self, from: SessionState, phase: Phase) {
        let to = phase.state();
        self.phase = phase;
        self.emit_transition(from, to);
    }

    fn emit_transition(&mut self, from: SessionState, to: SessionState) {
        if from == to {
            return;
        }
        tracing::info!(
            session_id = %self.session_id,
            lesson_id = %self.lesson.id(),
            %from,
            %to,
            "session state changed"
        );
        self.events.push(SessionEvent::StateChanged { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lesson_core::model::{LessonDraft, LessonId, QuestionDraft, RawOption};
    use lesson_core::time::fixed_clock;
    use storage::repository::Storage;

    use crate::error::SyncError;

    struct Silent;

    #[async_trait]
    impl LessonApi for Silent {
        async fn fetch_lesson(&self, lesson_id: LessonId) -> Result<LessonDraft, SyncError> {
            Err(SyncError::NotFound(lesson_id))
        }

        async fn report_progress(&self, _: LessonId, _: ProgressPercent) -> Result<(), SyncError> {
            Ok(())
        }

        async fn report_start(&self, _: LessonId) -> Result<(), SyncError> {
            Ok(())
        }

        async fn report_complete(&self, _: LessonId) -> Result<(), SyncError> {
            Ok(())
        }
    }

    fn controller(questions: usize) -> SessionController {
        let question = QuestionDraft {
            prompt: "Who speaks first?".into(),
            options: vec![
                RawOption::Choice {
                    text: "Agent".into(),
                    is_correct: true,
                },
                RawOption::Choice {
                    text: "Caller".into(),
                    is_correct: false,
                },
            ],
            correct_answer: None,
        };
        let lesson = LessonDraft {
            id: LessonId::new(3),
            title: "Openings".into(),
            questions: vec![question; questions],
            ..LessonDraft::default()
        }
        .validate()
        .unwrap();
        let clock = fixed_clock();
        let cooldowns = CooldownService::new(clock.clone(), Storage::in_memory().cooldowns);
        SessionController::new(
            Arc::new(lesson),
            EngineSettings::default(),
            clock,
            Arc::new(Silent),
            cooldowns,
        )
    }

    #[tokio::test]
    async fn quiz_actions_are_rejected_while_reading() {
        let mut session = controller(1);
        session.start().await.unwrap();

        let err = session.select_answer(0, 0).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                action: "select answer",
                state: SessionState::Reading
            }
        ));
        assert!(!session.can_submit());
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let mut session = controller(1);
        session.start().await.unwrap();
        assert!(matches!(
            session.start().await,
            Err(SessionError::InvalidTransition { action: "start", .. })
        ));
    }

    #[tokio::test]
    async fn finishing_reading_enters_quiz() {
        let mut session = controller(2);
        session.start().await.unwrap();
        assert_eq!(session.finish_reading().await.unwrap(), SessionState::Questioning);
        assert_eq!(session.progress(), ProgressPercent::FULL);

        let snapshot = session.snapshot();
        let quiz = snapshot.quiz.unwrap();
        assert_eq!(quiz.question_count, 2);
        assert_eq!(quiz.unanswered, 2);
        assert!(!snapshot.can_next);
        assert!(!snapshot.can_previous);

        let events = session.drain_events();
        assert_eq!(
            events,
            vec![
                SessionEvent::StateChanged {
                    from: SessionState::NotStarted,
                    to: SessionState::Reading
                },
                SessionEvent::StateChanged {
                    from: SessionState::Reading,
                    to: SessionState::FinishedReading
                },
                SessionEvent::StateChanged {
                    from: SessionState::FinishedReading,
                    to: SessionState::Questioning
                },
            ]
        );
    }

    #[tokio::test]
    async fn disposed_session_refuses_everything() {
        let mut session = controller(0);
        session.leave().await;
        session.leave().await;

        assert_eq!(session.state(), SessionState::Disposed);
        assert!(matches!(session.start().await, Err(SessionError::Disposed)));
        assert!(matches!(session.next(), Err(SessionError::Disposed)));
        assert_eq!(session.tick().await.unwrap(), SessionState::Disposed);
    }
}
