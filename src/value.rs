use std::{
    borrow::Cow,
    fmt,
    time::{Duration, SystemTime},
};

use chrono::{DateTime, Utc};

use crate::field::Field;

/// A typed value attached to a log field.
///
/// Scalars, strings, durations and timestamps are stored as-is and rendered
/// by the formatter; anything else can be carried through one of the opaque
/// constructors ([`display`](Self::display), [`debug`](Self::debug),
/// [`error`](Self::error), [`serde`](Self::serde)).
pub struct FieldValue(pub(crate) FieldValueInner);

pub(crate) enum FieldValueInner {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(Cow<'static, str>),
    Duration(Duration),
    Timestamp(DateTime<Utc>),
    Group(Vec<Field>),
    Debug(Box<dyn fmt::Debug + Send + Sync + 'static>),
    Display(Box<dyn fmt::Display + Send + Sync + 'static>),
    Error(Box<dyn std::error::Error + Send + Sync + 'static>),
    Serde(Box<dyn erased_serde::Serialize + Send + Sync + 'static>),
}

impl From<FieldValueInner> for FieldValue {
    fn from(inner: FieldValueInner) -> Self {
        FieldValue(inner)
    }
}

impl FieldValue {
    #[must_use]
    pub const fn null() -> Self {
        Self(FieldValueInner::Null)
    }

    /// Creates a group value holding nested fields in the given order.
    #[must_use]
    pub fn group(fields: impl IntoIterator<Item = Field>) -> Self {
        FieldValueInner::Group(fields.into_iter().collect()).into()
    }

    pub fn serde<S>(value: S) -> Self
    where
        S: serde::Serialize + Send + Sync + 'static,
    {
        let value = Box::new(value);
        FieldValueInner::Serde(value).into()
    }

    pub fn display<T>(value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        let value = Box::new(value);
        FieldValueInner::Display(value).into()
    }

    pub fn debug<T>(value: T) -> Self
    where
        T: fmt::Debug + Send + Sync + 'static,
    {
        let value = Box::new(value);
        FieldValueInner::Debug(value).into()
    }

    pub fn error<T>(value: T) -> Self
    where
        T: std::error::Error + Send + Sync + 'static,
    {
        let value = Box::new(value);
        FieldValueInner::Error(value).into()
    }

    /// Returns the string slice if this is a plain string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.0 {
            FieldValueInner::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self.0, FieldValueInner::Null)
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            FieldValueInner::Null => f.write_str("Null"),
            FieldValueInner::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            FieldValueInner::Int(v) => f.debug_tuple("Int").field(v).finish(),
            FieldValueInner::Uint(v) => f.debug_tuple("Uint").field(v).finish(),
            FieldValueInner::Float(v) => f.debug_tuple("Float").field(v).finish(),
            FieldValueInner::String(v) => f.debug_tuple("String").field(v).finish(),
            FieldValueInner::Duration(v) => f.debug_tuple("Duration").field(v).finish(),
            FieldValueInner::Timestamp(v) => f.debug_tuple("Timestamp").field(v).finish(),
            FieldValueInner::Group(v) => f.debug_tuple("Group").field(v).finish(),
            FieldValueInner::Debug(v) => f.debug_tuple("Debug").field(v).finish(),
            FieldValueInner::Display(v) => f.debug_tuple("Display").field(&v.to_string()).finish(),
            FieldValueInner::Error(v) => f.debug_tuple("Error").field(v).finish(),
            FieldValueInner::Serde(_) => f.write_str("Serde(..)"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValueInner::String(Cow::Owned(value.to_owned())).into()
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValueInner::String(Cow::Owned(value)).into()
    }
}

impl From<Cow<'static, str>> for FieldValue {
    fn from(value: Cow<'static, str>) -> Self {
        FieldValueInner::String(value).into()
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValueInner::Bool(value).into()
    }
}

macro_rules! impl_from_int {
    ($variant:ident => $target:ty: $($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValueInner::$variant(<$target>::from(value)).into()
                }
            }
        )*
    };
}

impl_from_int!(Int => i64: i8, i16, i32, i64);
impl_from_int!(Uint => u64: u8, u16, u32, u64);

impl From<isize> for FieldValue {
    fn from(value: isize) -> Self {
        // isize is at most 64 bits wide on every supported target.
        FieldValueInner::Int(value as i64).into()
    }
}

impl From<usize> for FieldValue {
    fn from(value: usize) -> Self {
        FieldValueInner::Uint(value as u64).into()
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValueInner::Float(f64::from(value)).into()
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValueInner::Float(value).into()
    }
}

impl From<Duration> for FieldValue {
    fn from(value: Duration) -> Self {
        FieldValueInner::Duration(value).into()
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValueInner::Timestamp(value).into()
    }
}

impl From<SystemTime> for FieldValue {
    fn from(value: SystemTime) -> Self {
        FieldValueInner::Timestamp(value.into()).into()
    }
}

impl From<Vec<Field>> for FieldValue {
    fn from(value: Vec<Field>) -> Self {
        FieldValueInner::Group(value).into()
    }
}

impl<T> From<Option<T>> for FieldValue
where
    T: Into<FieldValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Self::null, Into::into)
    }
}
