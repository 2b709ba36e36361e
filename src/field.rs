use std::borrow::Cow;

use crate::FieldValue;

/// Key of a log field.
pub type FieldKey = Cow<'static, str>;

/// Key of the error field.
pub const ERROR_KEY: &str = "error";
/// Key of the record timestamp header.
pub const TIME_KEY: &str = "time";
/// Key of the record level header.
pub const LEVEL_KEY: &str = "level";
/// Key of the caller location header.
pub const SOURCE_KEY: &str = "source";
/// Key of the record message header.
pub const MESSAGE_KEY: &str = "message";

/// Header keys in the order they are emitted.
pub const HEADER_KEYS: [&str; 4] = [TIME_KEY, LEVEL_KEY, SOURCE_KEY, MESSAGE_KEY];

/// A single named value attached to a log record.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use ambient_log::Field;
///
/// let fields = [
///     Field::new("user_id", 42),
///     Field::new("elapsed", Duration::from_millis(1500)),
/// ];
/// assert_eq!(fields[0].key, "user_id");
/// ```
#[derive(Debug)]
pub struct Field {
    pub key: FieldKey,
    pub value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<FieldKey>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates an `error` field holding the rendered error, or an empty string
    /// when there is no error.
    #[must_use]
    pub fn error(err: Option<&dyn std::error::Error>) -> Self {
        let rendered = err.map(ToString::to_string).unwrap_or_default();
        Self::new(ERROR_KEY, rendered)
    }
}

impl<K, V> From<(K, V)> for Field
where
    K: Into<FieldKey>,
    V: Into<FieldValue>,
{
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}
