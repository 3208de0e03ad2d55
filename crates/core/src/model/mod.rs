mod cooldown;
mod ids;
mod lesson;
mod percent;
pub mod question;
mod quiz;
mod reading;
mod settings;

pub use cooldown::CooldownRecord;
pub use ids::{LessonId, ParseIdError, SessionId};
pub use lesson::{ContentType, LessonContent, LessonDraft, LessonError};
pub use percent::ProgressPercent;
pub use question::{AnswerOption, CorrectAnswer, Question, QuestionDraft, QuestionError, RawOption};
pub use quiz::{QuizAttempt, QuizError, QuizResult};
pub use reading::ReadingSession;
pub use settings::{EngineSettings, EngineSettingsDraft, SettingsError};
