//! Logging infrastructure.
//!
//! Thin setup around the `tracing` ecosystem: a console subscriber for
//! normal runs and an optional appending file layer for long batch
//! conversions. `RUST_LOG` overrides the level picked on the command
//! line.

use std::io;
use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    /// Trace-level debugging (very verbose).
    Trace,
    /// Debug information, including every tool invocation.
    Debug,
    /// General information.
    #[default]
    Info,
    /// Warnings.
    Warn,
    /// Errors.
    Error,
}

impl LogLevel {
    /// Map a repeatable `-v` count to a level.
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG` when set, falling back to `default_level`.
/// Output goes to stderr so the run report on stdout stays clean.
/// Should be called once at startup.
pub fn init_tracing(default_level: LogLevel) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(env_filter(default_level))
        .init();
}

/// Initialize tracing with an additional append-only log file.
///
/// The file layer writes without ANSI colors; the console layer behaves
/// exactly as in [`init_tracing`].
pub fn init_tracing_with_file(default_level: LogLevel, log_file: &Path) -> io::Result<()> {
    let directory = log_file.parent().unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "log file has no file name"))?;

    std::fs::create_dir_all(directory)?;
    let appender = RollingFileAppender::new(Rotation::NEVER, directory, file_name);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(appender))
        .with(env_filter(default_level))
        .init();
    Ok(())
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)))
}

/// Convert LogLevel to filter string.
fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}
