use std::fmt;

use lesson_core::countdown::CountdownLevel;
use lesson_core::display::format_countdown;
use services::{SessionController, SessionError, SessionEvent, SessionState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    MissingOption,
    InvalidOption(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => f.write_str("type a command, or `help`"),
            CommandError::Unknown(raw) => write!(f, "unknown command: {raw}"),
            CommandError::MissingOption => f.write_str("answer needs an option number"),
            CommandError::InvalidOption(raw) => write!(f, "invalid option number: {raw}"),
        }
    }
}

impl std::error::Error for CommandError {}

/// One line of trainee input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Start,
    Finish,
    /// Zero-based option for the current question.
    Answer(usize),
    Next,
    Previous,
    Submit,
    Retry,
    Show,
    Help,
    Quit,
}

impl HostCommand {
    /// Parse a line; options are typed one-based, as displayed.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(CommandError::Empty);
        };
        let command = match head.to_ascii_lowercase().as_str() {
            "start" | "s" => Self::Start,
            "finish" | "done" | "f" => Self::Finish,
            "answer" | "a" => {
                let raw = words.next().ok_or(CommandError::MissingOption)?;
                let number: usize = raw
                    .parse()
                    .map_err(|_| CommandError::InvalidOption(raw.to_string()))?;
                let index = number
                    .checked_sub(1)
                    .ok_or_else(|| CommandError::InvalidOption(raw.to_string()))?;
                Self::Answer(index)
            }
            "next" | "n" => Self::Next,
            "prev" | "previous" | "p" => Self::Previous,
            "submit" => Self::Submit,
            "retry" => Self::Retry,
            "show" | "status" => Self::Show,
            "help" | "?" => Self::Help,
            "quit" | "leave" | "q" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

pub fn print_commands() {
    println!("Commands:");
    println!("  start            begin reading");
    println!("  finish           done reading");
    println!("  answer <n>       pick option n for the current question");
    println!("  next | prev      move between questions");
    println!("  submit           score the quiz");
    println!("  retry            start over after a failed attempt");
    println!("  show             print the current view");
    println!("  quit             leave the lesson");
}

/// Apply a command. Returns true when the host should leave.
///
/// # Errors
///
/// Returns `SessionError` when the command is not available in the current state.
pub async fn apply(session: &mut SessionController, command: HostCommand) -> Result<bool, SessionError> {
    match command {
        HostCommand::Start => {
            session.start().await?;
        }
        HostCommand::Finish => {
            session.finish_reading().await?;
        }
        HostCommand::Answer(option) => {
            let question = session
                .snapshot()
                .quiz
                .map_or(0, |quiz| quiz.current_index);
            session.select_answer(question, option)?;
            render(session);
        }
        HostCommand::Next => {
            session.next()?;
            render(session);
        }
        HostCommand::Previous => {
            session.previous()?;
            render(session);
        }
        HostCommand::Submit => {
            session.submit_quiz().await?;
        }
        HostCommand::Retry => {
            session.retry()?;
        }
        HostCommand::Show => render(session),
        HostCommand::Help => print_commands(),
        HostCommand::Quit => return Ok(true),
    }
    Ok(false)
}

/// Print queued notices and react to queued events.
pub fn flush(session: &mut SessionController) {
    let mut state_changed = false;
    for event in session.drain_events() {
        match event {
            SessionEvent::StateChanged { to, .. } => {
                state_changed |= !matches!(to, SessionState::Expired | SessionState::FinishedReading);
            }
            SessionEvent::Countdown {
                remaining_ms,
                level,
            } => {
                if should_announce(remaining_ms, level) {
                    println!(
                        "  {} left{}",
                        format_countdown(remaining_ms),
                        level_suffix(level)
                    );
                }
            }
        }
    }
    for notice in session.drain_notices() {
        println!("* {notice}");
    }
    if state_changed {
        render(session);
    }
}

/// Decided on the whole seconds shown by `format_countdown`, since ticks land
/// wherever the host interval fires within a second.
fn should_announce(remaining_ms: i64, level: CountdownLevel) -> bool {
    let shown_secs = remaining_ms.max(0) / 1_000;
    match level {
        CountdownLevel::Normal => shown_secs % 60 == 0,
        CountdownLevel::Warning => shown_secs % 10 == 0,
        CountdownLevel::Critical => shown_secs % 5 == 0,
    }
}

fn level_suffix(level: CountdownLevel) -> &'static str {
    match level {
        CountdownLevel::Normal => "",
        CountdownLevel::Warning => " (hurry up)",
        CountdownLevel::Critical => " (almost out of time!)",
    }
}

pub fn render(session: &SessionController) {
    let snapshot = session.snapshot();
    let lesson = session.lesson();
    println!();
    println!("== {} [{}] ==", lesson.title(), snapshot.state);

    match snapshot.state {
        SessionState::NotStarted => {
            if !lesson.description().is_empty() {
                println!("{}", lesson.description());
            }
            println!("Type `start` to begin.");
        }
        SessionState::Locked => {
            if let Some(display) = snapshot.cooldown_display() {
                println!("Locked. Available again in {display}.");
            }
        }
        SessionState::Reading => {
            if let Some(text) = lesson.text_body() {
                println!("{text}");
            }
            if let Some(video) = lesson.video_ref() {
                println!("Video: {video}");
            }
            match snapshot.countdown_display() {
                Some(display) => println!("Progress {}, {display} left.", snapshot.progress_percent),
                None => println!("Progress {}.", snapshot.progress_percent),
            }
            println!("Type `finish` when you are done.");
        }
        SessionState::Questioning => {
            if let Some(quiz) = &snapshot.quiz {
                if let Some(question) = lesson.questions().get(quiz.current_index) {
                    println!(
                        "Question {} of {}: {}",
                        quiz.current_index + 1,
                        quiz.question_count,
                        question.prompt()
                    );
                    for (index, option) in question.options().iter().enumerate() {
                        let marker = if quiz.selected == Some(index) { '>' } else { ' ' };
                        println!(" {marker} {}. {}", index + 1, option.text);
                    }
                }
                if snapshot.can_submit {
                    println!("All answered; `submit` when ready.");
                } else if quiz.unanswered > 0 {
                    println!("{} unanswered.", quiz.unanswered);
                }
            }
        }
        SessionState::Passed | SessionState::Failed => {
            if let Some(result) = snapshot.quiz_result {
                println!(
                    "Score {:.0}% ({} of {}).",
                    result.score_percent, result.correct_count, result.question_count
                );
            }
            if let Some(reason) = snapshot.failure {
                println!("Not passed: {reason}.");
            }
            if snapshot.can_retry {
                println!("Type `retry` to try again, or `quit`.");
            } else {
                println!("Type `quit` to leave.");
            }
        }
        SessionState::Expired | SessionState::FinishedReading | SessionState::Disposed => {}
    }
}
