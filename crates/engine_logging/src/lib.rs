#![deny(missing_docs)]
//! Shared logging utilities for the favlens workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! the [`Verbosity`] tiers the tool runs under, and initializers for the global
//! logger (runtime and tests).

use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// How much diagnostic output a run produces.
///
/// Matched URLs are always written to stdout; the tier only controls what goes
/// through the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
pub enum Verbosity {
    /// Nothing but matches.
    Silent,
    /// Run milestones and the final summary.
    #[default]
    Normal,
    /// Adds per-job failures.
    Verbose,
    /// Everything, including per-worker chatter.
    Debug,
}

impl Verbosity {
    /// Picks a tier from the usual CLI switches. `silent` wins over `debug`,
    /// which wins over `verbose`.
    pub fn from_flags(silent: bool, verbose: bool, debug: bool) -> Self {
        if silent {
            Verbosity::Silent
        } else if debug {
            Verbosity::Debug
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Level filter applied to the global logger for this tier.
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Silent => LevelFilter::Off,
            Verbosity::Normal => LevelFilter::Info,
            Verbosity::Verbose => LevelFilter::Debug,
            Verbosity::Debug => LevelFilter::Trace,
        }
    }

    /// True when per-job failures should be surfaced.
    pub fn shows_job_failures(self) -> bool {
        self >= Verbosity::Verbose
    }

    /// True for every tier except [`Verbosity::Silent`].
    pub fn is_chatty(self) -> bool {
        self != Verbosity::Silent
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Initializes the global logger for a run.
///
/// Terminal output goes to stderr so stdout stays reserved for matched URLs.
/// When `log_file` is given, the same records are also written there; a file
/// that cannot be created is reported on stderr and otherwise ignored.
pub fn initialize(verbosity: Verbosity, log_file: Option<&Path>) {
    let level = verbosity.level_filter();
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        if let Some(file_logger) = create_file_logger(path, level, config) {
            loggers.push(file_logger);
        }
    }

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
