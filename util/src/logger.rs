//! Logger setup shared by the workspace's binaries
//!
//! Records go to both stdout and the session's log file. Debug and trace records also show the
//! module they came from, which together with per-module level overrides keeps chatty modules
//! (such as the arc length reparameterisation) readable.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::fmt;

use colored::{ColoredString, Colorize};
use log::{self, info};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level less than `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Empty module name given a level override of `{0}`")]
    EmptyModuleName(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `module_levels` overrides `min_level` for the given module paths (and their submodules), for
/// example `("traj_lib::geom::reparam", LevelFilter::Info)` to hide subdivision traces.
///
/// # Notes
///
/// - `min_level` must be greater than `log::Level::Info`.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    min_level: self::LevelFilter,
    module_levels: &[(&str, LevelFilter)],
    session: &session::Session
) -> Result<(), LoggerInitError> {

    check_levels(min_level, module_levels)?;

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_record(
                    session::get_elapsed_seconds(),
                    record.level(),
                    record.target(),
                    message
                )
            ))
        })
        .level(min_level);

    for (module, level) in module_levels {
        dispatch = dispatch.level_for(module.to_string(), *level);
    }

    dispatch
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Ok(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log level: {:?}", min_level);
    for (module, level) in module_levels {
        info!("    Log level for {}: {:?}", module, level);
    }
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_levels(
    min_level: LevelFilter,
    module_levels: &[(&str, LevelFilter)]
) -> Result<(), LoggerInitError> {
    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    match module_levels.iter().find(|(module, _)| module.is_empty()) {
        Some((_, level)) => Err(LoggerInitError::EmptyModuleName(*level)),
        None => Ok(())
    }
}

/// Format a single log line, including the target for debug and trace records.
fn format_record(
    elapsed_s: f64,
    level: log::Level,
    target: &str,
    message: &fmt::Arguments
) -> String {
    if level > log::Level::Info {
        format!("[{:10.6} {}] {}: {}", elapsed_s, level_to_str(level), target, message)
    }
    else {
        format!("[{:10.6} {}] {}", elapsed_s, level_to_str(level), message)
    }
}

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info  => "INF".normal(),
        log::Level::Warn  => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
