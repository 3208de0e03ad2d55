use std::sync::Arc;

use lesson_core::model::{EngineSettings, LessonContent, LessonId};
use storage::repository::Storage;

use crate::Clock;
use crate::cooldown_service::{CooldownService, LockoutStatus};
use crate::error::AppServicesError;
use crate::sessions::SessionController;
use crate::sync::LessonApi;

/// Assembles the engine's collaborators and opens lesson sessions.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    settings: EngineSettings,
    api: Arc<dyn LessonApi>,
    cooldowns: CooldownService,
}

impl AppServices {
    /// Build services with lockouts kept in `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: EngineSettings,
        api: Arc<dyn LessonApi>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(storage, clock, settings, api))
    }

    /// Build services with lockouts kept in memory for this process only.
    #[must_use]
    pub fn in_memory(clock: Clock, settings: EngineSettings, api: Arc<dyn LessonApi>) -> Self {
        Self::new(Storage::in_memory(), clock, settings, api)
    }

    #[must_use]
    pub fn new(
        storage: Storage,
        clock: Clock,
        settings: EngineSettings,
        api: Arc<dyn LessonApi>,
    ) -> Self {
        let cooldowns = CooldownService::new(clock.clone(), Arc::clone(&storage.cooldowns))
            .with_lockout(settings.lockout());
        Self {
            clock,
            settings,
            api,
            cooldowns,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn cooldowns(&self) -> &CooldownService {
        &self.cooldowns
    }

    /// Fetch a lesson from the lesson service and open a session on it.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Sync` if the lesson cannot be fetched and
    /// `AppServicesError::Lesson` if its payload is invalid.
    pub async fn open_session(&self, lesson_id: LessonId) -> Result<SessionController, AppServicesError> {
        let draft = self.api.fetch_lesson(lesson_id).await?;
        let lesson = draft.validate()?;
        tracing::debug!(%lesson_id, title = lesson.title(), "lesson loaded");
        Ok(self.session_for(lesson))
    }

    /// Open a session on lesson content the host already holds.
    #[must_use]
    pub fn session_for(&self, lesson: LessonContent) -> SessionController {
        SessionController::new(
            Arc::new(lesson),
            self.settings.clone(),
            self.clock.clone(),
            Arc::clone(&self.api),
            self.cooldowns.clone(),
        )
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Cooldown` if the lock store cannot be read.
    pub async fn lockout_status(&self, lesson_id: LessonId) -> Result<LockoutStatus, AppServicesError> {
        Ok(self.cooldowns.status(lesson_id).await?)
    }
}
