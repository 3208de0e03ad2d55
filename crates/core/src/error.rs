use thiserror::Error;

use crate::model::{LessonError, QuizError, SettingsError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EngineSettingsDraft, LessonDraft};

    #[test]
    fn model_errors_roll_up() {
        let err: Error = LessonDraft::default().validate().unwrap_err().into();
        assert!(matches!(err, Error::Lesson(LessonError::EmptyTitle)));

        let draft = EngineSettingsDraft {
            pass_threshold_percent: Some(101),
            ..EngineSettingsDraft::default()
        };
        let err: Error = draft.validate().unwrap_err().into();
        assert!(matches!(err, Error::Settings(SettingsError::PassThreshold(101))));
    }
}
