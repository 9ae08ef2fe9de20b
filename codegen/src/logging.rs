//! Tracing setup for the command-line tool

use std::path::Path;

use strum::{Display, EnumString, IntoStaticStr, VariantNames};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Environment variable holding the tracing filter directive
pub const LOG_FILTER_ENV: &str = "JSONB_CODEGEN_LOG";

/// Environment variable selecting a directory for the log file instead of stderr
pub const LOG_DIR_ENV: &str = "JSONB_CODEGEN_LOG_DIR";

const LOG_FILE_NAME: &str = "jsonb_codegen.log";

/// Tracing levels accepted as a bare filter, parsed case-insensitively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr, VariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TracingLevel {
    /// Failures only
    Error,
    /// Failures and suspicious input
    Warn,
    /// One line per run phase
    Info,
    /// Per-type decisions
    Debug,
    /// Every resolution step and emitted statement
    Trace,
}

impl TracingLevel {
    /// The level as an `EnvFilter` directive
    #[must_use]
    pub fn as_str(self) -> &'static str { self.into() }
}

/// Build the filter from `JSONB_CODEGEN_LOG`, defaulting to `default_level`
///
/// An unparsable directive falls back to the default level rather than failing the build.
#[must_use]
pub fn env_filter(default_level: TracingLevel) -> EnvFilter {
    match std::env::var(LOG_FILTER_ENV) {
        Ok(directive) => EnvFilter::try_new(&directive).unwrap_or_else(|e| {
            eprintln!("Ignoring {LOG_FILTER_ENV}={directive}: {e}");
            EnvFilter::new(default_level.as_str())
        }),
        Err(_) => EnvFilter::new(default_level.as_str()),
    }
}

/// Install the global subscriber
///
/// Logs go to stderr unless `JSONB_CODEGEN_LOG_DIR` names a directory, in which case they are
/// written to `jsonb_codegen.log` there through a non-blocking appender. The returned guard
/// must be kept alive for the file writer to flush.
#[must_use]
pub fn init_tracing(default_level: TracingLevel) -> Option<WorkerGuard> {
    let filter = env_filter(default_level);

    if let Some(dir) = std::env::var_os(LOG_DIR_ENV) {
        let file_appender = tracing_appender::rolling::never(Path::new(&dir), LOG_FILE_NAME);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);
        Registry::default().with(filter).with(file_layer).init();
        return Some(guard);
    }

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    Registry::default().with(filter).with(stderr_layer).init();
    None
}
