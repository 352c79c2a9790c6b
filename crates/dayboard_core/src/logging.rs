//! Process-wide logging bootstrap.
//!
//! # Responsibility
//! - Start one rotating file logger per process.
//! - Route panics into the log as single-line, length-capped events.
//!
//! # Invariants
//! - Re-initializing with the same settings is a no-op.
//! - Different settings after the first successful init are rejected.
//! - Failures surface as `LoggingError`; this module never panics.
//! - Engine events carry ids and counts only, never note or message text.

use crate::config::EngineConfig;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};

const LOG_BASENAME: &str = "dayboard";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;
const PANIC_PAYLOAD_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();

/// Level and directory of a file logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub log_dir: PathBuf,
}

impl LoggingSettings {
    /// Parses `level` and checks that `log_dir` is an absolute path.
    pub fn new(level: &str, log_dir: impl AsRef<Path>) -> Result<Self, LoggingError> {
        let level = parse_level(level)?;
        let log_dir = log_dir.as_ref();
        if log_dir.as_os_str().is_empty() {
            return Err(LoggingError::InvalidDirectory(
                "log directory cannot be empty".to_string(),
            ));
        }
        if !log_dir.is_absolute() {
            return Err(LoggingError::InvalidDirectory(format!(
                "log directory must be absolute, got `{}`",
                log_dir.display()
            )));
        }
        Ok(Self {
            level,
            log_dir: log_dir.to_path_buf(),
        })
    }
}

struct ActiveLogger {
    settings: LoggingSettings,
    _handle: LoggerHandle,
}

/// Logging bootstrap failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    UnsupportedLevel(String),
    InvalidDirectory(String),
    CreateDirectory { path: PathBuf, message: String },
    Backend(String),
    /// Logging already runs with other settings.
    Conflict {
        active: LoggingSettings,
        requested: LoggingSettings,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected off|error|warn|info|debug|trace"
            ),
            Self::InvalidDirectory(message) => write!(f, "invalid log directory: {message}"),
            Self::CreateDirectory { path, message } => write!(
                f,
                "cannot create log directory `{}`: {message}",
                path.display()
            ),
            Self::Backend(message) => write!(f, "file logger failed to start: {message}"),
            Self::Conflict { active, requested } => write!(
                f,
                "logging already active at {} in `{}`; requested {} in `{}`",
                active.level,
                active.log_dir.display(),
                requested.level,
                requested.log_dir.display()
            ),
        }
    }
}

impl Error for LoggingError {}

/// Starts file logging at `level` under the absolute directory `log_dir`.
///
/// # Errors
/// - `UnsupportedLevel` / `InvalidDirectory` for bad arguments.
/// - `CreateDirectory` / `Backend` when the file backend cannot start.
/// - `Conflict` when logging already runs with other settings.
pub fn init_logging(level: &str, log_dir: impl AsRef<Path>) -> Result<(), LoggingError> {
    start(LoggingSettings::new(level, log_dir)?)
}

/// Starts file logging with the config's `log_level`, or
/// [`default_log_level`] when unset.
pub fn init_from_config(
    config: &EngineConfig,
    log_dir: impl AsRef<Path>,
) -> Result<(), LoggingError> {
    let level = config.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, log_dir)
}

fn start(requested: LoggingSettings) -> Result<(), LoggingError> {
    let active = ACTIVE.get_or_try_init(|| open_backend(&requested))?;
    if active.settings != requested {
        return Err(LoggingError::Conflict {
            active: active.settings.clone(),
            requested,
        });
    }
    Ok(())
}

fn open_backend(settings: &LoggingSettings) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&settings.log_dir).map_err(|err| LoggingError::CreateDirectory {
        path: settings.log_dir.clone(),
        message: err.to_string(),
    })?;

    let files = FileSpec::default()
        .directory(&settings.log_dir)
        .basename(LOG_BASENAME);
    let handle = Logger::try_with_str(settings.level.as_str().to_ascii_lowercase())
        .map_err(|err| LoggingError::Backend(err.to_string()))?
        .log_to_file(files)
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
        )
        .append()
        .write_mode(WriteMode::BufferAndFlush)
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    route_panics_to_log();
    info!(
        "event=logging_start module=logging status=ok level={} log_dir={} os={} version={}",
        settings.level,
        settings.log_dir.display(),
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        settings: settings.clone(),
        _handle: handle,
    })
}

/// Settings of the running logger, or `None` before initialization.
pub fn logging_status() -> Option<LoggingSettings> {
    ACTIVE.get().map(|active| active.settings.clone())
}

/// `debug` in debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn parse_level(raw: &str) -> Result<LevelFilter, LoggingError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("warning") {
        return Ok(LevelFilter::Warn);
    }
    trimmed
        .parse::<LevelFilter>()
        .map_err(|_| LoggingError::UnsupportedLevel(trimmed.to_string()))
}

// Runs inside the one-time backend init, so the hook is chained once.
fn route_panics_to_log() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let location = panic.location().map_or_else(
            || "unknown".to_string(),
            |at| format!("{}:{}", at.file(), at.line()),
        );
        error!(
            "event=panic module=logging status=error location={location} payload={}",
            panic_summary(panic)
        );
        previous(panic);
    }));
}

fn panic_summary(panic: &PanicHookInfo<'_>) -> String {
    let payload = panic.payload();
    let text = payload
        .downcast_ref::<&str>()
        .map(|text| (*text).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<non-string payload>".to_string());
    one_line(&text, PANIC_PAYLOAD_LIMIT)
}

/// Flattens line breaks and caps the length for single-line log records.
fn one_line(text: &str, max_chars: usize) -> String {
    crate::view::badge::preview(&text.replace(['\r', '\n'], " "), max_chars)
}

#[cfg(test)]
mod tests {
    use super::{
        init_logging, logging_status, one_line, parse_level, LoggingError, LoggingSettings,
    };
    use log::LevelFilter;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!(parse_level(" INFO ").expect("info"), LevelFilter::Info);
        assert_eq!(parse_level("warning").expect("warning alias"), LevelFilter::Warn);
        assert_eq!(
            parse_level("chatty"),
            Err(LoggingError::UnsupportedLevel("chatty".to_string()))
        );
    }

    #[test]
    fn relative_directories_are_rejected() {
        let err = LoggingSettings::new("info", "logs/dev").expect_err("relative path");
        assert!(matches!(err, LoggingError::InvalidDirectory(_)));
    }

    #[test]
    fn one_line_flattens_and_caps() {
        assert_eq!(one_line("a\nb\rc", 10), "a b c");
        assert_eq!(one_line("abcdefghij", 4), "abcd...");
    }

    // Only test in this crate that starts the global logger.
    #[test]
    fn repeated_init_is_idempotent_and_conflicts_are_rejected() {
        let first = tempfile::tempdir().expect("temp dir");
        let other = tempfile::tempdir().expect("temp dir");

        init_logging("info", first.path()).expect("first init");
        init_logging("INFO", first.path()).expect("same settings");

        let level_change = init_logging("debug", first.path()).expect_err("level change");
        assert!(matches!(level_change, LoggingError::Conflict { .. }));
        let dir_change = init_logging("info", other.path()).expect_err("dir change");
        assert!(dir_change.to_string().contains("already active"));

        let active = logging_status().expect("logger running");
        assert_eq!(active.level, LevelFilter::Info);
        assert_eq!(active.log_dir, first.path());
    }
}
