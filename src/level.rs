//! Severity levels.

use std::{fmt, str::FromStr};

use crate::Error;

/// Severity of a log record, ordered from least to most severe.
///
/// Each level sits a fixed step of four apart from its neighbours, with
/// `Debug` as the base, so threshold checks stay plain integer comparisons
/// and custom levels can be slotted in between later.
///
/// | Level   | Value |
/// |---------|-------|
/// | `Trace` | -8    |
/// | `Debug` | -4    |
/// | `Info`  | 0     |
/// | `Warn`  | 4     |
/// | `Error` | 8     |
/// | `Fatal` | 12    |
/// | `Panic` | 16    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(i8)]
pub enum Level {
    Trace = -8,
    Debug = -4,
    #[default]
    Info = 0,
    Warn = 4,
    Error = 8,
    /// Terminates the process after the record is written.
    Fatal = 12,
    /// Raises an unrecoverable panic after the record is written.
    Panic = 16,
}

const STEP: i8 = 4;

impl Level {
    /// All levels in ascending order.
    pub const ALL: [Self; 7] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
        Self::Panic,
    ];

    /// Returns the numeric value of the level.
    #[must_use]
    pub const fn as_i8(self) -> i8 {
        self as i8
    }

    /// Looks up a level by its numeric value.
    #[must_use]
    pub const fn from_i8(value: i8) -> Option<Self> {
        match value {
            -8 => Some(Self::Trace),
            -4 => Some(Self::Debug),
            0 => Some(Self::Info),
            4 => Some(Self::Warn),
            8 => Some(Self::Error),
            12 => Some(Self::Fatal),
            16 => Some(Self::Panic),
            _ => None,
        }
    }

    /// Returns the upper-case name used in emitted records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
            Self::Panic => "PANIC",
        }
    }

    /// Returns `true` for `Error` and every level above it.
    #[must_use]
    pub const fn is_error_tier(self) -> bool {
        self.as_i8() >= Self::Error.as_i8()
    }

    /// Maps the level onto the five levels of the [`log`] crate.
    ///
    /// `Fatal` and `Panic` have no counterpart and collapse into
    /// [`log::Level::Error`].
    #[must_use]
    pub const fn to_log_level(self) -> log::Level {
        match self {
            Self::Trace => log::Level::Trace,
            Self::Debug => log::Level::Debug,
            Self::Info => log::Level::Info,
            Self::Warn => log::Level::Warn,
            Self::Error | Self::Fatal | Self::Panic => log::Level::Error,
        }
    }

    /// Returns the most verbose [`log::LevelFilter`] that lets this level through.
    #[must_use]
    pub fn to_log_filter(self) -> log::LevelFilter {
        self.to_log_level().to_level_filter()
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::ParseLevel(s.to_owned()))
    }
}
