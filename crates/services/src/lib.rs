#![forbid(unsafe_code)]

pub mod app_services;
pub mod cooldown_service;
pub mod error;
pub mod notice;
pub mod sessions;
pub mod sync;

pub use lesson_core::Clock;

pub use app_services::AppServices;
pub use cooldown_service::{CooldownService, LockoutStatus};
pub use error::{AppServicesError, CooldownError, SessionError, SyncError};
pub use notice::{FailureReason, Notice, SyncAction};
pub use sessions::{SessionController, SessionEvent, SessionSnapshot, SessionState};
pub use sync::{HttpLessonApi, LessonApi, LessonApiConfig, OfflineLessonApi, SyncGateway};
