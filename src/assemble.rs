//! The record assembly pipeline.
//!
//! For every emitted record the assembler collects fields from the execution
//! context and from the call site, reconciles duplicate keys, places the error
//! field, orders the rest and renders everything into canonical attributes.

use std::{borrow::Cow, collections::BTreeMap};

use chrono::{DateTime, Utc};

use crate::{
    FieldValue, Level, LogContext,
    attribute::{AttrValue, Attribute},
    field::{ERROR_KEY, Field, FieldKey, LEVEL_KEY, MESSAGE_KEY, SOURCE_KEY, TIME_KEY},
    format::{Source, canonicalize, format_timestamp, rewrite_special},
    registry::FieldRegistry,
};

/// A log record as handed over by a call site.
#[derive(Debug)]
pub struct Record<'a> {
    pub level: Level,
    pub message: Cow<'a, str>,
    /// Fields supplied at the call site. If a key repeats, the last one wins.
    pub fields: &'a [Field],
    /// The rendered error of an error-tier call, if one was supplied.
    pub error: Option<FieldValue>,
    pub source: Option<Source<'a>>,
    pub time: DateTime<Utc>,
}

impl<'a> Record<'a> {
    /// Creates a record stamped with the current time and no fields.
    pub fn new(level: Level, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            level,
            message: message.into(),
            fields: &[],
            error: None,
            source: None,
            time: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: &'a [Field]) -> Self {
        self.fields = fields;
        self
    }

    /// Attaches the error of an error-tier call. A missing error is rendered as
    /// an empty string.
    #[must_use]
    pub fn with_error(mut self, err: Option<&dyn std::error::Error>) -> Self {
        self.error = Some(err.map(ToString::to_string).unwrap_or_default().into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: Source<'a>) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }
}

/// The final, ordered form of a record.
///
/// The header always holds `time`, `level`, `source` and `message`, in that
/// order. The fields never repeat a header key or each other. At error tier
/// and above the first field is `error`; every other field is sorted by key.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledRecord {
    level: Level,
    header: [Attribute; 4],
    fields: Vec<Attribute>,
}

impl AssembledRecord {
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// The `time`, `level`, `source` and `message` attributes.
    #[must_use]
    pub fn header(&self) -> &[Attribute] {
        &self.header
    }

    #[must_use]
    pub fn fields(&self) -> &[Attribute] {
        &self.fields
    }

    /// The rendered message, unless a field replaced it with a non-string value.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.header[3].value.as_str()
    }

    /// Header attributes followed by fields, in emission order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.header.iter().chain(&self.fields)
    }

    /// Looks up an attribute by key, in the header or the fields.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.attributes()
            .find(|attribute| attribute.key == key)
            .map(|attribute| &attribute.value)
    }
}

/// Assembles `record` against the ambient fields of `context`.
///
/// Precedence, lowest first: header values derived from the record, context
/// fields, the error value, call-site fields. A field using a header key
/// replaces that header value and is then rewritten like one. The message is
/// only replaced by a call-site field, never by a context field.
#[must_use]
pub fn assemble(registry: &FieldRegistry, context: &LogContext, record: &Record<'_>) -> AssembledRecord {
    let keys = registry.keys();
    let empty_error = FieldValue::from(String::new());

    let mut merged: BTreeMap<&str, &FieldValue> = BTreeMap::new();
    for key in keys.iter().filter(|key| *key != MESSAGE_KEY) {
        if let Some(value) = context.lookup(key) {
            merged.insert(key, value);
        }
    }
    if let Some(error) = &record.error {
        merged.insert(ERROR_KEY, error);
    }
    for field in record.fields {
        merged.insert(&field.key, &field.value);
    }
    if record.level.is_error_tier() {
        merged.entry(ERROR_KEY).or_insert(&empty_error);
    }

    let header = [
        header_attribute(&mut merged, TIME_KEY, || format_timestamp(record.time).into()),
        header_attribute(&mut merged, LEVEL_KEY, || record.level.as_str().into()),
        header_attribute(&mut merged, SOURCE_KEY, || {
            record
                .source
                .map_or(AttrValue::Null, |source| source.to_string().into())
        }),
        header_attribute(&mut merged, MESSAGE_KEY, || AttrValue::from(&*record.message)),
    ];

    let mut fields = Vec::with_capacity(merged.len());
    if record.level.is_error_tier() {
        if let Some(error) = merged.remove(ERROR_KEY) {
            fields.push(Attribute::new(ERROR_KEY, canonicalize(error)));
        }
    }
    fields.extend(
        merged
            .into_iter()
            .map(|(key, value)| Attribute::new(FieldKey::Owned(key.to_owned()), canonicalize(value))),
    );

    AssembledRecord {
        level: record.level,
        header,
        fields,
    }
}

fn header_attribute(
    merged: &mut BTreeMap<&str, &FieldValue>,
    key: &'static str,
    default: impl FnOnce() -> AttrValue,
) -> Attribute {
    let value = merged
        .remove(key)
        .map_or_else(default, |value| rewrite_special(key, value));
    Attribute::new(key, value)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn keys(record: &AssembledRecord) -> Vec<&str> {
        record.fields().iter().map(|a| &*a.key).collect()
    }

    #[test]
    fn test_context_fields_are_merged() {
        let registry = FieldRegistry::new();
        let ctx = LogContext::new().attach(&registry, "username", "alice");

        let record = assemble(&registry, &ctx, &Record::new(Level::Info, "hello"));

        assert_eq!(record.get("username"), Some(&AttrValue::from("alice")));
        assert_eq!(record.message(), Some("hello"));
    }

    #[test]
    fn test_call_site_overrides_context() {
        let registry = FieldRegistry::new();
        let ctx = LogContext::new().attach(&registry, "code", 2);
        let fields = [Field::new("code", 1)];

        let record = assemble(&registry, &ctx, &Record::new(Level::Info, "m").with_fields(&fields));

        assert_eq!(record.fields(), [Attribute::new("code", AttrValue::Int(1))]);
    }

    #[test]
    fn test_duplicate_call_site_keys_last_wins() {
        let registry = FieldRegistry::new();
        let fields = [Field::new("k", 1), Field::new("k", 2)];

        let record = assemble(&registry, &LogContext::new(), &Record::new(Level::Info, "m").with_fields(&fields));

        assert_eq!(record.fields(), [Attribute::new("k", AttrValue::Int(2))]);
    }

    #[test]
    fn test_fields_sorted_below_error_tier() {
        let registry = FieldRegistry::new();
        let ctx = LogContext::new()
            .attach(&registry, "zeta", 1)
            .attach(&registry, "alpha", 2);
        let fields = [Field::new("mid", 3), Field::new("error", "not first")];

        let record = assemble(&registry, &ctx, &Record::new(Level::Warn, "m").with_fields(&fields));

        assert_eq!(keys(&record), ["alpha", "error", "mid", "zeta"]);
    }

    #[test]
    fn test_error_first_at_error_tier() {
        let registry = FieldRegistry::new();
        let ctx = LogContext::new().attach(&registry, "alpha", 1);
        let err = std::io::Error::other("disk full");

        for level in [Level::Error, Level::Fatal, Level::Panic] {
            let record = assemble(&registry, &ctx, &Record::new(level, "m").with_error(Some(&err)));
            assert_eq!(keys(&record), ["error", "alpha"]);
            assert_eq!(record.fields()[0].value, AttrValue::from("disk full"));
        }
    }

    #[test]
    fn test_missing_error_at_error_tier_is_empty() {
        let registry = FieldRegistry::new();

        let with_none = assemble(
            &registry,
            &LogContext::new(),
            &Record::new(Level::Error, "m").with_error(None),
        );
        let without = assemble(&registry, &LogContext::new(), &Record::new(Level::Fatal, "m"));

        assert_eq!(with_none.fields(), [Attribute::new("error", "")]);
        assert_eq!(without.fields(), [Attribute::new("error", "")]);
    }

    #[test]
    fn test_no_error_field_below_error_tier() {
        let registry = FieldRegistry::new();
        let record = assemble(&registry, &LogContext::new(), &Record::new(Level::Info, "m"));
        assert!(record.get("error").is_none());
    }

    #[test]
    fn test_error_precedence() {
        let registry = FieldRegistry::new();
        let ctx = LogContext::new().attach(&registry, "error", "from context");
        let err = std::io::Error::other("from argument");

        let record = assemble(&registry, &ctx, &Record::new(Level::Error, "m").with_error(Some(&err)));
        assert_eq!(record.get("error"), Some(&AttrValue::from("from argument")));

        let fields = [Field::new("error", "from call site")];
        let record = assemble(
            &registry,
            &ctx,
            &Record::new(Level::Error, "m").with_error(Some(&err)).with_fields(&fields),
        );
        assert_eq!(record.get("error"), Some(&AttrValue::from("from call site")));

        let record = assemble(&registry, &ctx, &Record::new(Level::Error, "m"));
        assert_eq!(record.get("error"), Some(&AttrValue::from("from context")));
    }

    #[test]
    fn test_registered_keys_absent_from_context_are_skipped() {
        let registry = FieldRegistry::new();
        let _other = LogContext::new().attach(&registry, "session", "s-1");
        let ctx = LogContext::new().attach(&registry, "user", "alice");

        let record = assemble(&registry, &ctx, &Record::new(Level::Info, "m"));
        assert_eq!(keys(&record), ["user"]);
    }

    #[test]
    fn test_unregistered_context_key_is_invisible() {
        let registry = FieldRegistry::new();
        let ctx = LogContext::new().attach(&FieldRegistry::new(), "user", "alice");

        let record = assemble(&registry, &ctx, &Record::new(Level::Info, "m"));
        assert!(record.fields().is_empty());
    }

    #[test]
    fn test_header() {
        let registry = FieldRegistry::new();
        let record = assemble(
            &registry,
            &LogContext::new(),
            &Record::new(Level::Warn, "careful")
                .with_time(fixed_time())
                .with_source(Source::new("/srv/app/src/main.rs", 7)),
        );

        assert_eq!(
            record.header(),
            [
                Attribute::new("time", "2024-05-01T12:00:00Z"),
                Attribute::new("level", "WARN"),
                Attribute::new("source", "src/main.rs:7"),
                Attribute::new("message", "careful"),
            ]
        );
        assert_eq!(record.level(), Level::Warn);
    }

    #[test]
    fn test_reserved_keys_follow_precedence_then_rewrite() {
        let registry = FieldRegistry::new();
        let ctx = LogContext::new()
            .attach(&registry, "time", fixed_time())
            .attach(&registry, "level", "debug");
        let fields = [Field::new("level", "error"), Field::new("source", "/a/b/c.rs:9")];

        let record = assemble(
            &registry,
            &ctx,
            &Record::new(Level::Info, "m").with_fields(&fields),
        );

        assert_eq!(record.get("time"), Some(&AttrValue::from("2024-05-01T12:00:00Z")));
        assert_eq!(record.get("level"), Some(&AttrValue::from("ERROR")));
        assert_eq!(record.get("source"), Some(&AttrValue::from("b/c.rs:9")));
        assert!(record.fields().is_empty());
        // Filtering and error placement still follow the call's own level.
        assert_eq!(record.level(), Level::Info);
    }

    #[test]
    fn test_unknown_source_is_null() {
        let registry = FieldRegistry::new();
        let record = assemble(&registry, &LogContext::new(), &Record::new(Level::Info, "m"));
        assert_eq!(record.get("source"), Some(&AttrValue::Null));
    }

    #[test]
    fn test_same_rendering_from_context_and_call_site() {
        let registry = FieldRegistry::new();
        let ctx = LogContext::new()
            .attach(&registry, "elapsed", Duration::from_millis(1500))
            .attach(&registry, "at", fixed_time());
        let fields = [
            Field::new("elapsed_call", Duration::from_millis(1500)),
            Field::new("at_call", fixed_time()),
        ];

        let record = assemble(&registry, &ctx, &Record::new(Level::Info, "m").with_fields(&fields));

        assert_eq!(record.get("elapsed"), record.get("elapsed_call"));
        assert_eq!(record.get("at"), record.get("at_call"));
        assert_eq!(record.get("elapsed"), Some(&AttrValue::from("1.5s")));
    }

    #[test]
    fn test_no_duplicate_keys() {
        let registry = FieldRegistry::new();
        let ctx = LogContext::new()
            .attach(&registry, "a", 1)
            .attach(&registry, "b", 2)
            .attach(&registry, "message", "ctx message")
            .attach(&registry, "error", "ctx error");
        let fields = [Field::new("a", 3), Field::new("b", 4), Field::new("c", 5)];
        let err = std::io::Error::other("boom");

        let record = assemble(
            &registry,
            &ctx,
            &Record::new(Level::Error, "m").with_fields(&fields).with_error(Some(&err)),
        );

        let mut all = record.attributes().map(|a| &*a.key).collect::<Vec<_>>();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
        assert_eq!(record.message(), Some("m"));
    }

    #[test]
    fn test_context_message_does_not_replace_message() {
        let registry = FieldRegistry::new();
        let ctx = LogContext::new().attach(&registry, "message", "ambient");

        let record = assemble(&registry, &ctx, &Record::new(Level::Info, "the real message"));
        assert_eq!(record.message(), Some("the real message"));
        assert!(record.fields().is_empty());

        let fields = [Field::new("message", "from call site")];
        let record = assemble(
            &registry,
            &ctx,
            &Record::new(Level::Info, "the real message").with_fields(&fields),
        );
        assert_eq!(record.message(), Some("from call site"));
    }
}
