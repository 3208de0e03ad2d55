//! Shared error types for the services crate.

use thiserror::Error;

use lesson_core::model::{LessonError, LessonId, QuizError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::sessions::SessionState;

/// Errors from calls to the lesson service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error("lesson service base URL is invalid: {0}")]
    InvalidBaseUrl(String),
    #[error("lesson service returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("lesson {0} not found")]
    NotFound(LessonId),
    #[error("lesson service rejected the call: {0}")]
    Rejected(String),
}

/// Errors emitted by `CooldownService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CooldownError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the session controller.
///
/// Sync failures are not listed: they are recovered inside the controller and
/// surfaced as notices.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("{action} is not available while {state}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },
    #[error("session was disposed")]
    Disposed,
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Cooldown(#[from] CooldownError),
}

/// Errors emitted while bootstrapping app services or opening sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Cooldown(#[from] CooldownError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
}
