// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Logging initialization for host applications.
//!
//! The engine itself only uses the `log` facade; these helpers install an
//! `env_logger` backend with millisecond timestamps.

use crate::error::{Error, Result};

/// Log level for Herald logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl LogLevel {
    /// Lower-case name, as written in config files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = Error;

    /// Parse the `log_level` field of a config file.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(LogLevel::Off),
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(Error::invalid(format!("unknown log level '{}'", other))),
        }
    }
}

/// Initialize logging with console output at `level`.
///
/// # Errors
///
/// `Error::InvalidArgument` if a logger is already installed.
pub fn init_logging(level: LogLevel) -> Result<()> {
    env_logger::Builder::new()
        .filter_level(level.into())
        .format_timestamp_millis()
        .try_init()
        .map_err(|_| Error::invalid("logger already initialized"))
}

/// Initialize logging from `RUST_LOG`, falling back to `default_level`.
pub fn init_logging_env(default_level: LogLevel) -> Result<()> {
    let filter: log::LevelFilter = default_level.into();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter.to_string()))
        .format_timestamp_millis()
        .try_init()
        .map_err(|_| Error::invalid("logger already initialized"))
}

/// Initialize logging with a filter string (e.g. `"herald=debug,info"`).
pub fn init_logging_with_filter(filter: &str) -> Result<()> {
    if filter.trim().is_empty() {
        return Err(Error::invalid("empty log filter"));
    }

    env_logger::Builder::new()
        .parse_filters(filter)
        .format_timestamp_millis()
        .try_init()
        .map_err(|_| Error::invalid("logger already initialized"))
}
