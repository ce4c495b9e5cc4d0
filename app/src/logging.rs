//! FILENAME: app/src/logging.rs
// PURPOSE: Unified logging for the command-line front end.
// FORMAT: seq|level|category|message (category = log target)

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;

use crate::error::AppError;

/// Environment variable that overrides the verbosity flags.
pub const LOG_ENV_VAR: &str = "DRILLDOWN_LOG";

// ============================================================================
// UNIFIED LOGGING SYSTEM
// ============================================================================

/// Global sequence counter shared by every log line
static LOG_SEQ: AtomicU64 = AtomicU64::new(0);

/// Global log file handle
pub static LOG_FILE: Lazy<Mutex<Option<File>>> = Lazy::new(|| Mutex::new(None));

static LOGGER: UnifiedLogger = UnifiedLogger;

/// Get next sequence number
pub fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst) + 1
}

/// Initialize the unified log file (truncates an existing file)
pub fn init_log_file(path: &Path) -> Result<PathBuf, AppError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    writeln!(file, "# drilldown log started {}", chrono::Local::now().to_rfc3339())?;

    let mut log_file = LOG_FILE
        .lock()
        .map_err(|e| AppError::Config(format!("Lock error: {}", e)))?;
    *log_file = Some(file);

    Ok(path.to_path_buf())
}

/// Formats one line without writing it.
pub fn format_line(seq: u64, level: &str, category: &str, message: &str) -> String {
    format!("{}|{}|{}|{}", seq, level, category, message)
}

/// Write a log line in unified format to stderr and, when open, the log file.
/// Stdout is reserved for command output.
pub fn write_log(level: &str, category: &str, message: &str) {
    let line = format_line(next_seq(), level, category, message);

    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(ref mut file) = *guard {
            if let Err(e) = writeln!(file, "{}", line) {
                eprintln!("[LOG_ERROR] Failed to write: {}", e);
            }
            let _ = file.flush();
        }
    }

    eprintln!("{}", line);
}

/// Write an ENTER log line for function entry
pub fn write_log_enter(level: &str, category: &str, func_name: &str, params: &str) {
    let message = if params.is_empty() {
        format!("ENTER {}", func_name)
    } else {
        format!("ENTER {} {}", func_name, params)
    };
    write_log(level, category, &message);
}

/// Write an EXIT log line for function exit
pub fn write_log_exit(level: &str, category: &str, func_name: &str, result: &str) {
    let message = if result.is_empty() {
        format!("EXIT {}", func_name)
    } else {
        format!("EXIT {} {}", func_name, result)
    };
    write_log(level, category, &message);
}

// ============================================================================
// LOG FACADE BRIDGE
// ============================================================================

/// Routes `log` records from every crate into the unified format.
struct UnifiedLogger;

impl Log for UnifiedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            write_log(level_letter(record.level()), record.target(), &record.args().to_string());
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = LOG_FILE.lock() {
            if let Some(ref mut file) = *guard {
                let _ = file.flush();
            }
        }
    }
}

pub fn level_letter(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "E",
        log::Level::Warn => "W",
        log::Level::Info => "I",
        log::Level::Debug => "D",
        log::Level::Trace => "T",
    }
}

/// Verbosity from `-v` flags: 0 = warnings, 1 = info, 2 = debug, 3+ = trace.
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Parses a level name such as `debug` (used for the environment override).
pub fn parse_level(value: &str) -> Option<LevelFilter> {
    value.trim().parse::<LevelFilter>().ok()
}

/// Installs the unified logger. `DRILLDOWN_LOG` wins over `verbose`.
/// Installing twice keeps the first logger and only updates the level.
pub fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<(), AppError> {
    let level = std::env::var(LOG_ENV_VAR)
        .ok()
        .and_then(|v| parse_level(&v))
        .unwrap_or_else(|| level_for_verbosity(verbose));

    if let Some(path) = log_file {
        init_log_file(path)?;
    }

    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
    Ok(())
}

// ============================================================================
// MACRO DEFINITIONS & EXPORTS
// ============================================================================

// ENTER/EXIT macros for function tracing

#[macro_export]
macro_rules! log_enter {
    ($cat:expr, $func:expr) => {
        if log::log_enabled!(log::Level::Debug) {
            $crate::logging::write_log_enter("D", $cat, $func, "")
        }
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        if log::log_enabled!(log::Level::Debug) {
            $crate::logging::write_log_enter("D", $cat, $func, &format!($($arg)*))
        }
    };
}

#[macro_export]
macro_rules! log_exit {
    ($cat:expr, $func:expr) => {
        if log::log_enabled!(log::Level::Debug) {
            $crate::logging::write_log_exit("D", $cat, $func, "")
        }
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        if log::log_enabled!(log::Level::Debug) {
            $crate::logging::write_log_exit("D", $cat, $func, &format!($($arg)*))
        }
    };
}

// Re-export the macros so they can be imported via `use crate::logging::log_enter;`
pub use log_enter;
pub use log_exit;
