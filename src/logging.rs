/// Structured logging for the WAP report service
///
/// Provides context-rich logging with component and gauge identifiers,
/// timestamps, and severity levels. Supports both console output
/// and an append-only log file for scheduled runs.

use chrono::{DateTime, Utc};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::WapError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parses the `WAP_LOG_LEVEL` spelling of a level.
    pub fn from_name(name: &str) -> Option<LogLevel> {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Fetch,
    Classify,
    Report,
    Store,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Fetch => write!(f, "FETCH"),
            Component::Classify => write!(f, "CLASSIFY"),
            Component::Report => write!(f, "REPORT"),
            Component::Store => write!(f, "STORE"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - gauge has no URL or is known to be offline
    Expected,
    /// Unexpected failure - indicates service degradation or network trouble
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        // A poisoned lock only means another thread panicked mid-log.
        match LOGGER.lock() {
            Ok(mut guard) => *guard = Some(logger),
            Err(poisoned) => *poisoned.into_inner() = Some(logger),
        }
    }

    fn log(&self, level: LogLevel, component: Component, gauge_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = format_entry(Utc::now(), level, component, gauge_id, message);
        let gauge_part = gauge_id.map(|g| format!(" [{}]", g)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, gauge_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, gauge_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {}  // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

/// Formats one log line as written to the log file.
pub fn format_entry(
    at: DateTime<Utc>,
    level: LogLevel,
    component: Component,
    gauge_id: Option<&str>,
    message: &str,
) -> String {
    let gauge_part = gauge_id.map(|g| format!(" [{}]", g)).unwrap_or_default();
    format!(
        "{} {} {}{}: {}",
        at.format("%Y-%m-%d %H:%M:%S UTC"),
        level,
        component,
        gauge_part,
        message
    )
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, component: Component, gauge_id: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, component, gauge_id, message);
        }
    }
}

/// Log a general informational message
pub fn info(component: Component, gauge_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, component, gauge_id, message);
}

/// Log a warning message
pub fn warn(component: Component, gauge_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, component, gauge_id, message);
}

/// Log an error message
pub fn error(component: Component, gauge_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, component, gauge_id, message);
}

/// Log a debug message
pub fn debug(component: Component, gauge_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, component, gauge_id, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a gauge fetch failure
pub fn classify_fetch_failure(err: &WapError) -> FailureType {
    match err {
        WapError::HttpError(code) if *code >= 500 => FailureType::Unexpected,
        WapError::HttpError(404) => FailureType::Expected,
        WapError::HttpError(_) => FailureType::Unknown,
        WapError::FetchFailed { .. } => FailureType::Unexpected,
        // Gauge pages drop the value while a sensor is offline.
        WapError::NoObservedValue(_) => FailureType::Unknown,
        _ => FailureType::Unknown,
    }
}

/// Log a gauge fetch failure with automatic classification
pub fn log_fetch_failure(gauge_id: &str, operation: &str, err: &WapError) {
    let failure_type = classify_fetch_failure(err);

    let message = format!(
        "{} failed [{}]: {}",
        operation,
        failure_type,
        err
    );

    match failure_type {
        FailureType::Expected => debug(Component::Fetch, Some(gauge_id), &message),
        FailureType::Unexpected => error(Component::Fetch, Some(gauge_id), &message),
        FailureType::Unknown => warn(Component::Fetch, Some(gauge_id), &message),
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one river's fetch pass
pub fn log_fetch_summary(river: &str, total: usize, successful: usize, failed: usize) {
    let message = format!(
        "{}: {}/{} gauges reporting, {} without data",
        river,
        successful,
        total,
        failed
    );

    if failed == 0 {
        info(Component::Fetch, None, &message);
    } else if successful == 0 {
        error(Component::Fetch, None, &message);
    } else {
        warn(Component::Fetch, None, &message);
    }
}
