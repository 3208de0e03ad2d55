use std::fmt;
use std::sync::Arc;

use lesson_core::model::{EngineSettings, LessonDraft, LessonId};
use services::{
    AppServices, Clock, HttpLessonApi, LessonApi, LessonApiConfig, OfflineLessonApi,
    SessionController,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::time::{self, MissedTickBehavior};

mod host;
mod logging;

use host::HostCommand;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidLessonId { raw: String },
    InvalidDbUrl { raw: String },
    NoLessonSource,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLessonId { raw } => write!(f, "invalid --lesson-id value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::NoLessonSource => {
                f.write_str("run needs --lesson-file, or --lesson-id with --api")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- run    [--db <sqlite_url>] --lesson-file <path>");
    eprintln!("  cargo run -p app -- run    [--db <sqlite_url>] --lesson-id <id> --api <url>");
    eprintln!("  cargo run -p app -- status [--db <sqlite_url>] --lesson-id <id>");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:lessons.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LESSON_DB_URL, LESSON_ID, LESSON_API_BASE_URL, LESSON_API_TOKEN");
    eprintln!("  RUST_LOG, DEBUG_LOGGING=1");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Status,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    lesson_id: Option<LessonId>,
    lesson_file: Option<String>,
    api_url: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("LESSON_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://lessons.sqlite3".into(), normalize_sqlite_url);
        let mut lesson_id = std::env::var("LESSON_ID")
            .ok()
            .and_then(|value| value.parse::<LessonId>().ok());
        let mut lesson_file = None;
        let mut api_url = std::env::var("LESSON_API_BASE_URL").ok();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--lesson-id" => {
                    let value = require_value(args, "--lesson-id")?;
                    let parsed = value
                        .parse::<LessonId>()
                        .map_err(|_| ArgsError::InvalidLessonId { raw: value.clone() })?;
                    lesson_id = Some(parsed);
                }
                "--lesson-file" => lesson_file = Some(require_value(args, "--lesson-file")?),
                "--api" => api_url = Some(require_value(args, "--api")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            lesson_id,
            lesson_file,
            api_url,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// Resolve where lessons come from and which one to open.
fn lesson_source(args: &Args) -> Result<(Arc<dyn LessonApi>, LessonId), Box<dyn std::error::Error>> {
    if let Some(path) = &args.lesson_file {
        let raw = std::fs::read_to_string(path)?;
        let mut draft: LessonDraft = serde_json::from_str(&raw)?;
        if let Some(id) = args.lesson_id {
            draft.id = id;
        }
        let lesson_id = draft.id;
        let offline = OfflineLessonApi::new();
        offline.insert(draft);
        tracing::info!(%lesson_id, path, "serving lesson from file");
        let api: Arc<dyn LessonApi> = Arc::new(offline);
        return Ok((api, lesson_id));
    }

    let (Some(url), Some(lesson_id)) = (&args.api_url, args.lesson_id) else {
        return Err(ArgsError::NoLessonSource.into());
    };
    let token = std::env::var("LESSON_API_TOKEN").ok();
    let config = LessonApiConfig::new(url, token)?;
    let api: Arc<dyn LessonApi> = Arc::new(HttpLessonApi::new(config));
    Ok((api, lesson_id))
}

async fn drive(session: &mut SessionController) -> Result<(), Box<dyn std::error::Error>> {
    let input = BufReader::new(tokio::io::stdin());
    let interrupted = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(%err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };
    drive_with(session, input, interrupted).await
}

/// Run the session until the trainee quits, input ends, `shutdown` resolves or
/// an error occurs. The session is left on every one of those paths.
async fn drive_with<R, S>(
    session: &mut SessionController,
    input: R,
    shutdown: S,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let outcome = interact(session, input, shutdown).await;
    session.leave().await;
    host::flush(session);
    outcome
}

async fn interact<R, S>(
    session: &mut SessionController,
    input: R,
    shutdown: S,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = input.lines();
    let mut interval = time::interval(std::time::Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    session.check_lock().await?;
    host::render(session);
    host::print_commands();

    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => {
                tracing::info!(session_id = %session.session_id(), "interrupted");
                return Ok(());
            }
            _ = interval.tick() => {
                session.tick().await?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                match HostCommand::parse(&line) {
                    Ok(command) => match host::apply(session, command).await {
                        Ok(true) => return Ok(()),
                        Ok(false) => {}
                        Err(err) => println!("! {err}"),
                    },
                    Err(err) => println!("! {err}"),
                }
            }
        }
        host::flush(session);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Run,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;
    let settings = EngineSettings::default();
    let clock = Clock::default_clock();

    match cmd {
        Command::Run => {
            let (api, lesson_id) = lesson_source(&parsed)?;
            let services = AppServices::new_sqlite(&parsed.db_url, clock, settings, api).await?;
            let mut session = services.open_session(lesson_id).await?;
            tracing::info!(%lesson_id, session_id = %session.session_id(), "session opened");
            drive(&mut session).await
        }
        Command::Status => {
            let lesson_id = parsed.lesson_id.ok_or(ArgsError::MissingValue {
                flag: "--lesson-id",
            })?;
            let api: Arc<dyn LessonApi> = Arc::new(OfflineLessonApi::new());
            let services = AppServices::new_sqlite(&parsed.db_url, clock, settings, api).await?;
            let status = services.lockout_status(lesson_id).await?;
            if status.is_locked() {
                println!("lesson {lesson_id}: locked, available again in {}", status.display());
            } else {
                println!("lesson {lesson_id}: available");
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    logging::init();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use lesson_core::model::{ContentType, ProgressPercent};
    use lesson_core::time::fixed_clock;
    use services::{SessionState, SyncError};

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Progress(u8),
        Start,
        Complete,
    }

    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingApi {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LessonApi for RecordingApi {
        async fn fetch_lesson(&self, lesson_id: LessonId) -> Result<LessonDraft, SyncError> {
            Err(SyncError::NotFound(lesson_id))
        }

        async fn report_progress(&self, _: LessonId, percent: ProgressPercent) -> Result<(), SyncError> {
            self.calls.lock().unwrap().push(Call::Progress(percent.value()));
            Ok(())
        }

        async fn report_start(&self, _: LessonId) -> Result<(), SyncError> {
            self.calls.lock().unwrap().push(Call::Start);
            Ok(())
        }

        async fn report_complete(&self, _: LessonId) -> Result<(), SyncError> {
            self.calls.lock().unwrap().push(Call::Complete);
            Ok(())
        }
    }

    fn timed_session(api: &Arc<RecordingApi>) -> SessionController {
        let api: Arc<dyn LessonApi> = api.clone();
        let services = AppServices::in_memory(fixed_clock(), EngineSettings::default(), api);
        let lesson = LessonDraft {
            id: LessonId::new(3),
            title: "Holding a call".into(),
            text_body: Some("Ask before you hold.".into()),
            content_type: ContentType::Text,
            time_budget_minutes: Some(5),
            ..LessonDraft::default()
        }
        .validate()
        .unwrap();
        services.session_for(lesson)
    }

    #[tokio::test]
    async fn interrupt_while_reading_burns_the_attempt() {
        let api = Arc::new(RecordingApi::default());
        let mut session = timed_session(&api);
        session.start().await.unwrap();

        let (stdin, _keep_open) = tokio::io::duplex(64);
        drive_with(&mut session, BufReader::new(stdin), std::future::ready(()))
            .await
            .unwrap();

        assert_eq!(session.state(), SessionState::Disposed);
        assert_eq!(api.calls(), vec![Call::Start, Call::Progress(0), Call::Complete]);
    }

    #[tokio::test]
    async fn end_of_input_while_reading_burns_the_attempt() {
        let api = Arc::new(RecordingApi::default());
        let mut session = timed_session(&api);

        let input: &[u8] = b"start\n";
        drive_with(&mut session, input, std::future::pending())
            .await
            .unwrap();

        assert_eq!(session.state(), SessionState::Disposed);
        assert_eq!(api.calls(), vec![Call::Start, Call::Progress(0), Call::Complete]);
    }

    #[tokio::test]
    async fn errors_are_returned_after_leaving() {
        let api = Arc::new(RecordingApi::default());
        let mut session = timed_session(&api);
        session.start().await.unwrap();
        session.leave().await;

        let input: &[u8] = b"";
        let outcome = drive_with(&mut session, input, std::future::pending()).await;

        assert!(outcome.is_err());
        assert_eq!(session.state(), SessionState::Disposed);
    }
}
