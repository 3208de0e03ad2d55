use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::LessonId;
use crate::model::question::{Question, QuestionDraft, QuestionError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title must not be empty")]
    EmptyTitle,
    #[error("time budget must be at least one minute")]
    ZeroTimeBudget,
    #[error("question {index}: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },
}

/// Which media a lesson presents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    Video,
    Both,
}

impl ContentType {
    #[must_use]
    pub fn has_video(self) -> bool {
        matches!(self, ContentType::Video | ContentType::Both)
    }
}

/// Lesson payload as served by the lesson service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDraft {
    pub id: LessonId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub text_body: Option<String>,
    #[serde(default)]
    pub video_ref: Option<String>,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub time_budget_minutes: Option<u32>,
    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
}

impl LessonDraft {
    /// Validate the payload into an immutable `LessonContent`.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if the title is blank, the time budget is zero,
    /// or any question fails validation.
    pub fn validate(self) -> Result<LessonContent, LessonError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        if self.time_budget_minutes == Some(0) {
            return Err(LessonError::ZeroTimeBudget);
        }

        let questions = self
            .questions
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                draft
                    .validate()
                    .map_err(|source| LessonError::InvalidQuestion { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LessonContent {
            id: self.id,
            title,
            description: self.description.trim().to_string(),
            text_body: normalize_optional(self.text_body),
            video_ref: normalize_optional(self.video_ref),
            content_type: self.content_type,
            time_budget_minutes: self.time_budget_minutes,
            questions,
        })
    }
}

/// Immutable lesson content driving one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonContent {
    id: LessonId,
    title: String,
    description: String,
    text_body: Option<String>,
    video_ref: Option<String>,
    content_type: ContentType,
    time_budget_minutes: Option<u32>,
    questions: Vec<Question>,
}

impl LessonContent {
    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn text_body(&self) -> Option<&str> {
        self.text_body.as_deref()
    }

    #[must_use]
    pub fn video_ref(&self) -> Option<&str> {
        self.video_ref.as_deref()
    }

    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    #[must_use]
    pub fn time_budget_minutes(&self) -> Option<u32> {
        self.time_budget_minutes
    }

    /// The hard reading deadline, if this lesson is time-boxed.
    #[must_use]
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_minutes
            .map(|minutes| Duration::minutes(i64::from(minutes)))
    }

    #[must_use]
    pub fn is_time_boxed(&self) -> bool {
        self.time_budget_minutes.is_some()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn has_questions(&self) -> bool {
        !self.questions.is_empty()
    }

    /// Whitespace-separated words in the text body.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.text_body
            .as_deref()
            .map_or(0, |text| text.split_whitespace().count())
    }

    /// Leaving a time-boxed or video lesson mid-reading burns the attempt.
    #[must_use]
    pub fn abandoning_counts_as_failure(&self) -> bool {
        self.is_time_boxed() || self.content_type.has_video()
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|val| !val.trim().is_empty())
}
