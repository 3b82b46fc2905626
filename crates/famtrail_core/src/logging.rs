//! Process-wide logging bootstrap.
//!
//! # Responsibility
//! - Start one flexi_logger backend per process, writing either rolling
//!   files or stderr.
//! - Emit stable `event=... module=... status=...` diagnostic events.
//!
//! # Invariants
//! - Starting again with identical settings is a no-op.
//! - Starting again with a different level or target fails with
//!   `LoggingError::Conflict`; the active backend keeps running.
//! - Nothing in here panics.

use crate::config::LoggingConfig;
use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const FILE_BASENAME: &str = "famtrail";
const ROTATE_AT_BYTES: u64 = 5 * 1024 * 1024;
const KEEP_FILES: usize = 3;
const PANIC_TEXT_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    /// Log directory is empty or relative.
    InvalidDir(String),
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// Logging already runs with other settings.
    Conflict {
        active: LogSettings,
        requested: LogSettings,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::InvalidDir(message) => write!(f, "invalid log directory: {message}"),
            Self::CreateDir { path, source } => write!(
                f,
                "cannot create log directory `{}`: {source}",
                path.display()
            ),
            Self::Backend(err) => write!(f, "logger backend failed: {err}"),
            Self::Conflict { active, requested } => write!(
                f,
                "logging already runs as {active}; refusing to switch to {requested}"
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let level = match raw.trim().to_ascii_lowercase().as_str() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            other => return Err(LoggingError::UnsupportedLevel(other.to_string())),
        };
        Ok(level)
    }
}

/// Where log records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Rolling files in an absolute directory.
    Dir(PathBuf),
    Stderr,
}

impl LogTarget {
    /// Parses a user-provided directory; it must be absolute.
    pub fn dir(raw: &str) -> Result<Self, LoggingError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LoggingError::InvalidDir("path is empty".to_string()));
        }
        let path = Path::new(trimmed);
        if !path.is_absolute() {
            return Err(LoggingError::InvalidDir(format!(
                "`{trimmed}` is not absolute"
            )));
        }
        Ok(Self::Dir(path.to_path_buf()))
    }
}

/// Level and target of the process logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub target: LogTarget,
}

impl LogSettings {
    pub fn from_config(config: &LoggingConfig) -> Result<Self, LoggingError> {
        let target = match &config.dir {
            Some(dir) => LogTarget::dir(&dir.to_string_lossy())?,
            None => LogTarget::Stderr,
        };
        Ok(Self {
            level: config.level.parse()?,
            target,
        })
    }
}

impl Display for LogSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.target {
            LogTarget::Dir(dir) => write!(f, "`{}` in `{}`", self.level.as_str(), dir.display()),
            LogTarget::Stderr => write!(f, "`{}` on stderr", self.level.as_str()),
        }
    }
}

/// Starts rolling file logs under the absolute `log_dir`.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LoggingError> {
    start(LogSettings {
        level: level.parse()?,
        target: LogTarget::dir(log_dir)?,
    })
}

/// Starts logging to stderr, for command-line runs.
pub fn init_stderr_logging(level: &str) -> Result<(), LoggingError> {
    start(LogSettings {
        level: level.parse()?,
        target: LogTarget::Stderr,
    })
}

/// Starts the process logger, or checks that the running one matches.
pub fn start(settings: LogSettings) -> Result<(), LoggingError> {
    let active = ACTIVE.get_or_try_init(|| {
        let handle = build_logger(&settings)?;
        PANIC_HOOK.get_or_init(install_panic_hook);
        info!(
            "event=app_start module=core status=ok platform={} version={} debug_build={}",
            std::env::consts::OS,
            env!("CARGO_PKG_VERSION"),
            cfg!(debug_assertions)
        );
        info!(
            "event=core_init module=core status=ok logging={}",
            settings
        );
        Ok::<_, LoggingError>(ActiveLogger {
            settings: settings.clone(),
            _handle: handle,
        })
    })?;

    if active.settings == settings {
        Ok(())
    } else {
        Err(LoggingError::Conflict {
            active: active.settings.clone(),
            requested: settings,
        })
    }
}

fn build_logger(settings: &LogSettings) -> Result<LoggerHandle, LoggingError> {
    let logger = Logger::try_with_str(settings.level.as_str()).map_err(LoggingError::Backend)?;
    let logger = match &settings.target {
        LogTarget::Stderr => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::default_format),
        LogTarget::Dir(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
                path: dir.clone(),
                source,
            })?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
                        .basename(FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(ROTATE_AT_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(KEEP_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
    };
    logger.start().map_err(LoggingError::Backend)
}

/// Settings of the running logger, if any.
pub fn logging_status() -> Option<LogSettings> {
    ACTIVE.get().map(|active| active.settings.clone())
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        LogLevel::Debug.as_str()
    } else {
        LogLevel::Info.as_str()
    }
}

fn install_panic_hook() {
    let chained = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Payloads may quote names or places from the data; keep one capped line.
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location,
            one_line(&panic_text(panic_info), PANIC_TEXT_LIMIT)
        );
        chained(panic_info);
    }));
}

fn panic_text(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    payload
        .downcast_ref::<&str>()
        .map(|text| (*text).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<non-string payload>".to_string())
}

fn one_line(text: &str, limit: usize) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    if flat.chars().count() <= limit {
        return flat;
    }
    let mut capped = flat.chars().take(limit).collect::<String>();
    capped.push_str("...");
    capped
}
