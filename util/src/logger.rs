//! Session logging
//!
//! All workspace binaries log through the [`log`] macros. This module wires those macros to two
//! fern sinks: a coloured, compact stdout sink for watching a run live, and a plain-text sink
//! writing the session log file, which carries the record target so trace output can be
//! attributed to a module after the fact.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use fern::Dispatch;
use log::{info, LevelFilter};
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The minimum log level must include `INFO`, got `{0}`")]
    LevelTooCoarse(LevelFilter),

    #[error("Could not open the session log file: {0}")]
    LogFile(std::io::Error),

    #[error("Could not install the logger: {0}")]
    SetLogger(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise logging for this execution and emit the startup banner.
///
/// `min_level` must include `Info`, since the banner and most operational output are logged at
/// that level.
///
/// Must be called exactly once, after the session has been created.
pub fn logger_init(
    exec_name: &str,
    min_level: LevelFilter,
    session: &Session,
) -> Result<(), LoggerInitError> {
    if min_level < LevelFilter::Info {
        return Err(LoggerInitError::LevelTooCoarse(min_level));
    }

    let stdout_sink = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}",
                session::get_elapsed_seconds(),
                level_tag(record.level()),
                message
            ))
        })
        .chain(std::io::stdout());

    // No colour escapes in the file sink, so the session log stays greppable
    let log_file = fern::log_file(&session.log_file_path).map_err(LoggerInitError::LogFile)?;
    let file_sink = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {:5}] {}: {}",
                session::get_elapsed_seconds(),
                record.level(),
                record.target(),
                message
            ))
        })
        .chain(log_file);

    Dispatch::new()
        .level(min_level)
        .chain(stdout_sink)
        .chain(file_sink)
        .apply()
        .map_err(LoggerInitError::SetLogger)?;

    info!("---- {} ----", exec_name);
    info!("Session epoch: {}", session::get_epoch());
    info!("Session directory: {:?}", session.session_root);
    info!("Logging at {:?} to {:?}", min_level, session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Coloured level tag for the stdout sink
fn level_tag(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRACE".dimmed().italic(),
        log::Level::Debug => "DEBUG".cyan(),
        log::Level::Info => "INFO ".normal(),
        log::Level::Warn => "WARN ".yellow(),
        log::Level::Error => "ERROR".red().bold(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    /// A minimum level above `Info` would swallow the banner, so init must refuse it before
    /// touching the global logger or the log file.
    #[test]
    fn test_coarse_min_level_rejected() {
        let session = Session {
            session_root: PathBuf::new(),
            log_file_path: PathBuf::new(),
        };

        match logger_init("test", LevelFilter::Warn, &session) {
            Err(LoggerInitError::LevelTooCoarse(level)) => assert_eq!(level, LevelFilter::Warn),
            other => panic!("Expected LevelTooCoarse, got {:?}", other),
        }
    }
}
