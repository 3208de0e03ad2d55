//! Logging setup for the terminal host.
//!
//! Logs go to stderr so they never interleave with the lesson view on stdout.
//! `RUST_LOG` wins when set; otherwise `DEBUG_LOGGING=1` raises the workspace
//! crates to debug.

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_DIRECTIVE: &str = "info";
const DEBUG_DIRECTIVE: &str = "info,app=debug,services=debug,storage=debug,lesson_core=debug";

pub fn init() {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok_and(|value| value != "0");
    let directive = if debug_logging {
        DEBUG_DIRECTIVE
    } else {
        DEFAULT_DIRECTIVE
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .init();

    tracing::debug!(debug_logging, "logging initialized");
}
