mod api;
mod gateway;

pub use api::{HttpLessonApi, LessonApi, LessonApiConfig, OfflineLessonApi};
pub use gateway::{ProgressDebounce, SyncGateway};
