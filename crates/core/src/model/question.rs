use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt must not be empty")]
    EmptyPrompt,
    #[error("question needs at least two options, got {count}")]
    TooFewOptions { count: usize },
    #[error("option {index} has empty text")]
    EmptyOption { index: usize },
    #[error("question has no correct option")]
    NoCorrectOption,
    #[error("question has {count} correct options, expected exactly one")]
    MultipleCorrectOptions { count: usize },
}

//
// ─── WIRE SHAPES ──────────────────────────────────────────────────────────────
//

/// An answer option as it arrives from lesson authoring.
///
/// Older lessons store options as bare strings and mark the right one through
/// the question's `correctAnswer`; newer ones carry an `isCorrect` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawOption {
    Choice {
        text: String,
        #[serde(rename = "isCorrect", default)]
        is_correct: bool,
    },
    Text(String),
}

/// Reference to the correct option for bare-string options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Index(usize),
    Text(String),
}

impl CorrectAnswer {
    fn matches(&self, index: usize, text: &str) -> bool {
        match self {
            CorrectAnswer::Index(i) => *i == index,
            CorrectAnswer::Text(t) => t.trim() == text.trim(),
        }
    }
}

/// Unvalidated question as delivered by the lesson service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    #[serde(alias = "question")]
    pub prompt: String,
    pub options: Vec<RawOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<CorrectAnswer>,
}

impl QuestionDraft {
    /// Normalize options into `{text, is_correct}` form and validate.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is empty, fewer than two options
    /// exist, an option is blank, or the question does not have exactly one
    /// correct option.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                count: self.options.len(),
            });
        }

        let mut options = Vec::with_capacity(self.options.len());
        for (index, raw) in self.options.into_iter().enumerate() {
            let option = match raw {
                RawOption::Choice { text, is_correct } => AnswerOption { text, is_correct },
                RawOption::Text(text) => {
                    let is_correct = self
                        .correct_answer
                        .as_ref()
                        .is_some_and(|answer| answer.matches(index, &text));
                    AnswerOption { text, is_correct }
                }
            };
            if option.text.trim().is_empty() {
                return Err(QuestionError::EmptyOption { index });
            }
            options.push(option);
        }

        let correct: Vec<usize> = options
            .iter()
            .enumerate()
            .filter(|(_, option)| option.is_correct)
            .map(|(index, _)| index)
            .collect();
        let correct_index = match correct.as_slice() {
            [] => return Err(QuestionError::NoCorrectOption),
            [only] => *only,
            many => {
                return Err(QuestionError::MultipleCorrectOptions { count: many.len() });
            }
        };

        Ok(Question {
            prompt,
            options,
            correct_index,
        })
    }
}

//
// ─── DOMAIN ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub text: String,
    pub is_correct: bool,
}

/// A validated multiple-choice question with exactly one correct option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    prompt: String,
    options: Vec<AnswerOption>,
    correct_index: usize,
}

impl Question {
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.correct_index
    }
}
