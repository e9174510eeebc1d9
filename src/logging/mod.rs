//! Diagnostic logging collaborator
//!
//! The queue does not own a logging subsystem; it calls an injected
//! [`QueueLogger`] for worker panics, drain progress, and shutdown events.
//! This module carries the trait, a typed configuration struct, and two small
//! implementations so the queue is usable standalone. There is deliberately
//! no process-global logger: every queue gets its own explicit instance.

use crate::core::error::{Result, WorkQueueError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity threshold for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warning = 2,
    Error = 3,
    Critical = 4,
    Fatal = 5,
}

impl LogLevel {
    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
            LogLevel::Fatal => "FATAL",
        }
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Debug => Blue,
            LogLevel::Info => Green,
            LogLevel::Warning => Yellow,
            LogLevel::Error => Red,
            LogLevel::Critical => BrightRed,
            LogLevel::Fatal => BrightRed,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// Diagnostic logger interface the queue calls into
///
/// Implementations must be safe to call from any worker thread.
pub trait QueueLogger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
    fn critical(&self, message: &str);
    fn fatal(&self, message: &str);
}

/// Typed logger configuration
///
/// Recognized options are named fields; unknown options cannot exist.
/// `syslog` is recognized for compatibility but not supported — building a
/// logger with it set fails with `InvalidConfiguration`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub stdout: bool,
    pub syslog: bool,
    pub level: LogLevel,
    pub prefix: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            syslog: false,
            level: LogLevel::Debug,
            prefix: String::new(),
        }
    }
}

impl LoggerConfig {
    /// Validate the configuration, normalizing the prefix
    pub fn validate(self) -> Result<Self> {
        if self.syslog {
            return Err(WorkQueueError::invalid_config(
                "syslog",
                "syslog output is not supported",
            ));
        }
        Ok(self.normalize())
    }

    /// Apply the prefix fallback
    fn normalize(mut self) -> Self {
        if self.prefix.trim().is_empty() {
            self.prefix = "DEFAULT".to_string();
        }
        self
    }
}

/// Console logger writing one line per call
///
/// Output shape: `HH:MM:SS.mmm [PREFIX] ▶ LEVEL message`, with the level
/// colored when the `console` feature is enabled. Messages below the
/// configured level are discarded.
pub struct ConsoleLogger {
    config: LoggerConfig,
}

impl ConsoleLogger {
    pub fn new(config: LoggerConfig) -> Result<Self> {
        let config = config.validate()?;
        Ok(Self { config })
    }

    /// Console logger with the default configuration and the given prefix
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            config: LoggerConfig {
                prefix: prefix.into(),
                ..LoggerConfig::default()
            }
            .normalize(),
        }
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    fn emit(&self, level: LogLevel, message: &str) {
        if level < self.config.level || !self.config.stdout {
            return;
        }

        let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");

        #[cfg(feature = "console")]
        let level_text = {
            use colored::Colorize;
            level.to_str().color(level.color_code()).to_string()
        };
        #[cfg(not(feature = "console"))]
        let level_text = level.to_str().to_string();

        println!(
            "{} [{}] ▶ {} {}",
            timestamp, self.config.prefix, level_text, message
        );
    }
}

impl QueueLogger for ConsoleLogger {
    fn debug(&self, message: &str) {
        self.emit(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.emit(LogLevel::Info, message);
    }

    fn warning(&self, message: &str) {
        self.emit(LogLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.emit(LogLevel::Error, message);
    }

    fn critical(&self, message: &str) {
        self.emit(LogLevel::Critical, message);
    }

    fn fatal(&self, message: &str) {
        self.emit(LogLevel::Fatal, message);
    }
}

/// Logger that discards everything; the default collaborator
#[derive(Debug, Clone, Copy, Default)]
pub struct NopLogger;

impl QueueLogger for NopLogger {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
    fn critical(&self, _message: &str) {}
    fn fatal(&self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("Warning".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("FATAL".parse::<LogLevel>().unwrap(), LogLevel::Fatal);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Error < LogLevel::Critical);
        assert!(LogLevel::Critical < LogLevel::Fatal);
    }

    #[test]
    fn test_config_rejects_syslog() {
        let config = LoggerConfig {
            syslog: true,
            ..LoggerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            crate::core::error::WorkQueueError::InvalidConfiguration { .. }
        ));
    }

    #[test]
    fn test_config_defaults_empty_prefix() {
        let config = LoggerConfig {
            prefix: "   ".to_string(),
            ..LoggerConfig::default()
        };
        let config = config.validate().unwrap();
        assert_eq!(config.prefix, "DEFAULT");
    }

    #[test]
    fn test_console_logger_construction() {
        let logger = ConsoleLogger::new(LoggerConfig::default()).unwrap();
        assert_eq!(logger.config().prefix, "DEFAULT");

        let logger = ConsoleLogger::with_prefix("QUEUE");
        assert_eq!(logger.config().prefix, "QUEUE");

        // The prefix fallback applies here too, without touching validation
        let logger = ConsoleLogger::with_prefix("");
        assert_eq!(logger.config().prefix, "DEFAULT");
        assert!(logger.config().stdout);
    }

    #[test]
    fn test_nop_logger_is_silent() {
        // Mostly a compile-time check that the trait is object safe
        let logger: Box<dyn QueueLogger> = Box::new(NopLogger);
        logger.debug("ignored");
        logger.fatal("ignored");
    }
}
