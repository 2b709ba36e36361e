//! Environment driven configuration.

use std::path::PathBuf;

use crate::{
    Level,
    sink::{Format, Sink, WriterSink},
};

/// Variable selecting the minimum emitted level.
pub const LEVEL_ENV: &str = "LOG_LEVEL";
/// Variable selecting the output encoding, `json` or `text`.
pub const FORMAT_ENV: &str = "LOG_FORMAT";
/// Variable naming a file to append records to instead of stdout.
pub const FILE_ENV: &str = "LOG_FILE";

/// Settings of the default logger.
///
/// Unrecognized values fall back to the defaults: `INFO`, JSON, stdout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub level: Level,
    pub format: Format,
    pub file: Option<PathBuf>,
}

impl Config {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let level = lookup(LEVEL_ENV)
            .and_then(|value| value.parse().ok())
            .unwrap_or_default();
        let format = lookup(FORMAT_ENV)
            .and_then(|value| value.parse().ok())
            .unwrap_or_default();
        let file = lookup(FILE_ENV)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Self {
            level,
            format,
            file,
        }
    }

    /// Opens the configured destination.
    ///
    /// If the log file cannot be opened, records go to stdout instead and the
    /// failure is reported on stderr.
    #[must_use]
    pub fn open_sink(&self) -> Box<dyn Sink> {
        if let Some(path) = &self.file {
            match WriterSink::append(path, self.format) {
                Ok(sink) => return Box::new(sink),
                // The logger is not usable yet, so stderr is the only channel left.
                Err(err) => eprintln!("{err}, logging to stdout"),
            }
        }
        Box::new(WriterSink::stdout(self.format))
    }
}
