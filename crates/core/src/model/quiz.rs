use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::question::Question;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz has no questions")]
    Empty,
    #[error("question index {index} out of range ({count} questions)")]
    QuestionOutOfRange { index: usize, count: usize },
    #[error("option index {option} out of range for question {question} ({count} options)")]
    OptionOutOfRange {
        question: usize,
        option: usize,
        count: usize,
    },
    #[error("current question has no selected answer")]
    NoSelection,
    #[error("already at the first question")]
    AtFirstQuestion,
    #[error("already at the last question")]
    AtLastQuestion,
    #[error("{unanswered} question(s) still unanswered")]
    Incomplete { unanswered: usize },
    #[error("quiz already submitted")]
    AlreadySubmitted,
    #[error("answers do not match the question set")]
    QuestionSetMismatch,
}

//
// ─── RESULT ───────────────────────────────────────────────────────────────────
//

/// Scored outcome of a submitted quiz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub correct_count: usize,
    pub question_count: usize,
    pub score_percent: f64,
    pub passed: bool,
}

impl QuizResult {
    /// Score `correct_count` out of `question_count` against `pass_threshold` percent.
    ///
    /// The pass decision is made in integers so `score_percent >= threshold`
    /// holds exactly, without float rounding at the boundary.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(correct_count: usize, question_count: usize, pass_threshold: u8) -> Self {
        let score_percent = if question_count == 0 {
            0.0
        } else {
            correct_count as f64 / question_count as f64 * 100.0
        };
        let passed = question_count > 0
            && correct_count.saturating_mul(100)
                >= usize::from(pass_threshold).saturating_mul(question_count);
        Self {
            correct_count,
            question_count,
            score_percent,
            passed,
        }
    }
}

//
// ─── ATTEMPT ──────────────────────────────────────────────────────────────────
//

/// Navigation and answer capture for one pass through a question set.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizAttempt {
    current_index: usize,
    option_counts: Vec<usize>,
    selected_answers: Vec<Option<usize>>,
    result: Option<QuizResult>,
}

impl QuizAttempt {
    /// Begin an attempt over `questions` with every answer unset.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` if there are no questions.
    pub fn new(questions: &[Question]) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }
        Ok(Self {
            current_index: 0,
            option_counts: questions.iter().map(Question::option_count).collect(),
            selected_answers: vec![None; questions.len()],
            result: None,
        })
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.selected_answers.len()
    }

    #[must_use]
    pub fn selected_answers(&self) -> &[Option<usize>] {
        &self.selected_answers
    }

    #[must_use]
    pub fn selected(&self, question_index: usize) -> Option<usize> {
        self.selected_answers.get(question_index).copied().flatten()
    }

    #[must_use]
    pub fn result(&self) -> Option<QuizResult> {
        self.result
    }

    #[must_use]
    pub fn unanswered(&self) -> usize {
        self.selected_answers.iter().filter(|s| s.is_none()).count()
    }

    /// Record a selection without moving the cursor.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if either index is out of range or the quiz was submitted.
    pub fn select_answer(&mut self, question_index: usize, option_index: usize) -> Result<(), QuizError> {
        if self.result.is_some() {
            return Err(QuizError::AlreadySubmitted);
        }
        let count = self.question_count();
        let option_count = *self
            .option_counts
            .get(question_index)
            .ok_or(QuizError::QuestionOutOfRange {
                index: question_index,
                count,
            })?;
        if option_index >= option_count {
            return Err(QuizError::OptionOutOfRange {
                question: question_index,
                option: option_index,
                count: option_count,
            });
        }
        self.selected_answers[question_index] = Some(option_index);
        Ok(())
    }

    #[must_use]
    pub fn can_go_next(&self) -> bool {
        self.result.is_none()
            && self.selected(self.current_index).is_some()
            && self.current_index + 1 < self.question_count()
    }

    #[must_use]
    pub fn can_go_previous(&self) -> bool {
        self.result.is_none() && self.current_index > 0
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.result.is_none() && self.unanswered() == 0
    }

    /// Move to the next question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoSelection` if the current question is unanswered,
    /// or `QuizError::AtLastQuestion` at the end.
    pub fn next(&mut self) -> Result<usize, QuizError> {
        if self.result.is_some() {
            return Err(QuizError::AlreadySubmitted);
        }
        if self.selected(self.current_index).is_none() {
            return Err(QuizError::NoSelection);
        }
        if self.current_index + 1 >= self.question_count() {
            return Err(QuizError::AtLastQuestion);
        }
        self.current_index += 1;
        Ok(self.current_index)
    }

    /// Move to the previous question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AtFirstQuestion` at index 0.
    pub fn previous(&mut self) -> Result<usize, QuizError> {
        if self.result.is_some() {
            return Err(QuizError::AlreadySubmitted);
        }
        if self.current_index == 0 {
            return Err(QuizError::AtFirstQuestion);
        }
        self.current_index -= 1;
        Ok(self.current_index)
    }

    /// Score the attempt. Each question counts when the selection equals its
    /// correct option index.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Incomplete` while answers are missing, and
    /// `QuizError::AlreadySubmitted` on a second submit.
    pub fn submit(&mut self, questions: &[Question], pass_threshold: u8) -> Result<QuizResult, QuizError> {
        if self.result.is_some() {
            return Err(QuizError::AlreadySubmitted);
        }
        if questions.len() != self.question_count() {
            return Err(QuizError::QuestionSetMismatch);
        }
        let unanswered = self.unanswered();
        if unanswered > 0 {
            return Err(QuizError::Incomplete { unanswered });
        }

        let correct_count = questions
            .iter()
            .zip(&self.selected_answers)
            .filter(|(question, selected)| selected.is_some_and(|option| question.is_correct(option)))
            .count();
        let result = QuizResult::score(correct_count, questions.len(), pass_threshold);
        self.result = Some(result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::{QuestionDraft, RawOption};

    fn question(correct: usize) -> Question {
        QuestionDraft {
            prompt: "Q".into(),
            options: (0..3)
                .map(|i| RawOption::Choice {
                    text: format!("option {i}"),
                    is_correct: i == correct,
                })
                .collect(),
            correct_answer: None,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn selection_does_not_advance() {
        let questions = vec![question(0), question(1)];
        let mut attempt = QuizAttempt::new(&questions).unwrap();
        attempt.select_answer(0, 2).unwrap();
        assert_eq!(attempt.current_index(), 0);
        assert_eq!(attempt.selected_answers(), &[Some(2), None]);
    }

    #[test]
    fn next_requires_current_selection() {
        let questions = vec![question(0), question(1)];
        let mut attempt = QuizAttempt::new(&questions).unwrap();
        assert!(!attempt.can_go_next());
        assert_eq!(attempt.next().unwrap_err(), QuizError::NoSelection);

        attempt.select_answer(0, 0).unwrap();
        assert!(attempt.can_go_next());
        assert_eq!(attempt.next().unwrap(), 1);

        attempt.select_answer(1, 1).unwrap();
        assert!(!attempt.can_go_next());
        assert_eq!(attempt.next().unwrap_err(), QuizError::AtLastQuestion);
    }

    #[test]
    fn previous_blocked_at_start() {
        let questions = vec![question(0), question(1)];
        let mut attempt = QuizAttempt::new(&questions).unwrap();
        assert!(!attempt.can_go_previous());
        assert_eq!(attempt.previous().unwrap_err(), QuizError::AtFirstQuestion);

        attempt.select_answer(0, 0).unwrap();
        attempt.next().unwrap();
        assert!(attempt.can_go_previous());
        assert_eq!(attempt.previous().unwrap(), 0);
    }

    #[test]
    fn submit_requires_every_answer() {
        let questions = vec![question(0), question(1)];
        let mut attempt = QuizAttempt::new(&questions).unwrap();
        attempt.select_answer(0, 0).unwrap();
        assert!(!attempt.can_submit());
        assert_eq!(
            attempt.submit(&questions, 70).unwrap_err(),
            QuizError::Incomplete { unanswered: 1 }
        );
    }

    #[test]
    fn scores_against_correct_indices() {
        let questions = vec![question(0), question(1)];
        let mut attempt = QuizAttempt::new(&questions).unwrap();
        attempt.select_answer(0, 0).unwrap();
        attempt.select_answer(1, 2).unwrap();

        let result = attempt.submit(&questions, 70).unwrap();
        assert_eq!(result.correct_count, 1);
        assert!((result.score_percent - 50.0).abs() < f64::EPSILON);
        assert!(!result.passed);
        assert_eq!(
            attempt.submit(&questions, 70).unwrap_err(),
            QuizError::AlreadySubmitted
        );
    }

    #[test]
    fn pass_boundary_is_inclusive() {
        assert!(QuizResult::score(7, 10, 70).passed);
        assert!(!QuizResult::score(6, 10, 70).passed);
        assert!(!QuizResult::score(2, 3, 70).passed);
        assert!(QuizResult::score(3, 3, 70).passed);
    }

    #[test]
    fn rejects_out_of_range_selection() {
        let questions = vec![question(0)];
        let mut attempt = QuizAttempt::new(&questions).unwrap();
        assert!(matches!(
            attempt.select_answer(1, 0).unwrap_err(),
            QuizError::QuestionOutOfRange { index: 1, count: 1 }
        ));
        assert!(matches!(
            attempt.select_answer(0, 3).unwrap_err(),
            QuizError::OptionOutOfRange { option: 3, .. }
        ));
    }

    #[test]
    fn empty_question_set_is_rejected() {
        assert_eq!(QuizAttempt::new(&[]).unwrap_err(), QuizError::Empty);
    }
}
