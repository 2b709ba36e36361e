//! Conversion of typed field values into their external form.

use std::{fmt, time::Duration};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{
    Level,
    attribute::{AttrValue, Attribute},
    field::{LEVEL_KEY, SOURCE_KEY, TIME_KEY},
    value::{FieldValue, FieldValueInner},
};

/// Caller location of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source<'a> {
    pub file: &'a str,
    pub line: u32,
}

impl<'a> Source<'a> {
    #[must_use]
    pub const fn new(file: &'a str, line: u32) -> Self {
        Self { file, line }
    }

    /// Returns the location of the caller, following `#[track_caller]`
    /// frames up to the first untracked one.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Source<'static> {
        let location = std::panic::Location::caller();
        Source::new(location.file(), location.line())
    }
}

/// Renders `dir/file.rs:line`, keeping only the last two path segments.
impl fmt::Display for Source<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", short_path(self.file), self.line)
    }
}

fn short_path(path: &str) -> &str {
    let is_separator = |c: char| c == '/' || c == '\\';
    let Some(last) = path.rfind(is_separator) else {
        return path;
    };
    match path[..last].rfind(is_separator) {
        Some(previous) => &path[previous + 1..],
        None => path,
    }
}

/// Renders a timestamp in RFC 3339 with second precision, in UTC.
#[must_use]
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Renders a duration as a compact unit string such as `1.5s`, `1m30s`,
/// `2h0m0s`, `250ms` or `0s`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    const MICRO: u128 = 1_000;
    const MILLI: u128 = 1_000_000;
    const SECOND: u128 = 1_000_000_000;

    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_owned();
    }
    if nanos < MICRO {
        return format!("{nanos}ns");
    }
    if nanos < MILLI {
        return format!("{}µs", decimal(nanos, MICRO));
    }
    if nanos < SECOND {
        return format!("{}ms", decimal(nanos, MILLI));
    }

    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = total_secs / 60 % 60;
    let seconds = decimal(
        u128::from(total_secs % 60) * SECOND + u128::from(duration.subsec_nanos()),
        SECOND,
    );
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

// `value / unit` with the remainder as trailing-zero-free decimals.
fn decimal(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let fraction = value % unit;
    if fraction == 0 {
        return whole.to_string();
    }

    let width = unit.ilog10() as usize;
    let digits = format!("{fraction:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// Converts a field value into its canonical external form.
///
/// The result only depends on the value, never on where the field came from.
#[must_use]
pub fn canonicalize(value: &FieldValue) -> AttrValue {
    match &value.0 {
        FieldValueInner::Null => AttrValue::Null,
        FieldValueInner::Bool(v) => AttrValue::Bool(*v),
        FieldValueInner::Int(v) => AttrValue::Int(*v),
        FieldValueInner::Uint(v) => AttrValue::Uint(*v),
        FieldValueInner::Float(v) => AttrValue::Float(*v),
        FieldValueInner::String(v) => AttrValue::String(v.to_string()),
        FieldValueInner::Duration(v) => AttrValue::String(format_duration(*v)),
        FieldValueInner::Timestamp(v) => AttrValue::String(format_timestamp(*v)),
        FieldValueInner::Group(fields) => AttrValue::Group(
            fields
                .iter()
                .map(|field| Attribute::new(field.key.clone(), canonicalize(&field.value)))
                .collect(),
        ),
        FieldValueInner::Debug(v) => AttrValue::String(format!("{v:?}")),
        FieldValueInner::Display(v) => AttrValue::String(v.to_string()),
        FieldValueInner::Error(v) => AttrValue::String(v.to_string()),
        FieldValueInner::Serde(v) => serde_json::to_value(v)
            .map_or_else(|err| AttrValue::String(format!("!ERROR: {err}")), AttrValue::Json),
    }
}

/// Canonicalizes a value supplied under one of the reserved header keys.
///
/// - `time`: timestamps use the fixed [`format_timestamp`] form.
/// - `level`: a level name in any case, or a numeric level value, becomes the
///   upper-case level name.
/// - `source`: a `path:line` string is shortened like [`Source`].
///
/// Anything else falls back to [`canonicalize`].
#[must_use]
pub fn rewrite_special(key: &str, value: &FieldValue) -> AttrValue {
    let rewritten = match (key, &value.0) {
        (TIME_KEY, FieldValueInner::Timestamp(time)) => Some(format_timestamp(*time)),
        (LEVEL_KEY, FieldValueInner::String(name)) => {
            name.parse::<Level>().ok().map(|level| level.as_str().to_owned())
        }
        (LEVEL_KEY, FieldValueInner::Int(number)) => i8::try_from(*number)
            .ok()
            .and_then(Level::from_i8)
            .map(|level| level.as_str().to_owned()),
        (SOURCE_KEY, FieldValueInner::String(location)) => {
            location.rsplit_once(':').and_then(|(file, line)| {
                let line = line.parse().ok()?;
                Some(Source::new(file, line).to_string())
            })
        }
        _ => None,
    };

    rewritten.map_or_else(|| canonicalize(value), AttrValue::String)
}
