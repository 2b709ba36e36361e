//! Destinations for assembled records.

use std::{
    fmt::{self, Write as _},
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
    str::FromStr,
    sync::Arc,
};

use parking_lot::Mutex;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{
    AssembledRecord, Error,
    attribute::{AttrValue, Attribute},
};

/// Receives assembled records and writes them somewhere.
///
/// Values arrive already canonicalized; a sink only encodes them. Write
/// errors are reported back to the logger, which drops the record.
pub trait Sink: Send + Sync {
    /// Encodes and writes a single record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be encoded or written.
    fn write(&self, record: &AssembledRecord) -> io::Result<()>;

    /// Flushes buffered output, if any.
    fn flush(&self) {}
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&self, record: &AssembledRecord) -> io::Result<()> {
        (**self).write(record)
    }

    fn flush(&self) {
        (**self).flush();
    }
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn write(&self, record: &AssembledRecord) -> io::Result<()> {
        (**self).write(record)
    }

    fn flush(&self) {
        (**self).flush();
    }
}

/// Output encoding of a [`WriterSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// One JSON object per line.
    #[default]
    Json,
    /// One `key=value` line per record.
    Text,
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            s if s.eq_ignore_ascii_case("json") => Ok(Self::Json),
            s if s.eq_ignore_ascii_case("text") => Ok(Self::Text),
            _ => Err(Error::ParseFormat(s.to_owned())),
        }
    }
}

impl Format {
    /// Encodes `record` as a single newline-terminated line.
    ///
    /// # Errors
    ///
    /// Returns an error if a JSON value cannot be serialized.
    pub fn encode(self, record: &AssembledRecord) -> io::Result<Vec<u8>> {
        let mut buf = match self {
            Self::Json => serde_json::to_vec(record)?,
            Self::Text => encode_text(record).into_bytes(),
        };
        buf.push(b'\n');
        Ok(buf)
    }
}

/// A sink encoding records onto an [`io::Write`] destination.
///
/// Each record is encoded in full before the writer lock is taken, so
/// concurrent records never interleave.
pub struct WriterSink<W> {
    format: Format,
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W, format: Format) -> Self {
        Self {
            format,
            writer: Mutex::new(writer),
        }
    }

    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl WriterSink<io::Stdout> {
    #[must_use]
    pub fn stdout(format: Format) -> Self {
        Self::new(io::stdout(), format)
    }
}

impl WriterSink<File> {
    /// Opens `path` for appending, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn append(path: impl AsRef<Path>, format: Format) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| Error::OpenFile {
                path: path.to_owned(),
                source,
            })?;
        Ok(Self::new(file, format))
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write(&self, record: &AssembledRecord) -> io::Result<()> {
        let buf = self.format.encode(record)?;

        let mut writer = self.writer.lock();
        writer.write_all(&buf)?;
        writer.flush()
    }

    fn flush(&self) {
        let _ = self.writer.lock().flush();
    }
}

impl<W> fmt::Debug for WriterSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSink")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl Serialize for AssembledRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.header().len() + self.fields().len()))?;
        for attribute in self.attributes() {
            map.serialize_entry(&*attribute.key, &attribute.value)?;
        }
        map.end()
    }
}

fn encode_text(record: &AssembledRecord) -> String {
    let mut line = String::new();
    for attribute in record.attributes() {
        push_text_attribute(&mut line, "", attribute);
    }
    line
}

fn push_text_attribute(line: &mut String, prefix: &str, attribute: &Attribute) {
    let AttrValue::Group(attributes) = &attribute.value else {
        if !line.is_empty() {
            line.push(' ');
        }
        push_text_string(line, &format!("{prefix}{}", attribute.key));
        line.push('=');
        push_text_value(line, &attribute.value);
        return;
    };

    let prefix = format!("{prefix}{}.", attribute.key);
    for attribute in attributes {
        push_text_attribute(line, &prefix, attribute);
    }
}

fn push_text_value(line: &mut String, value: &AttrValue) {
    match value {
        AttrValue::Null => line.push_str("<nil>"),
        AttrValue::Bool(v) => line.push_str(if *v { "true" } else { "false" }),
        AttrValue::Int(v) => {
            let _ = write!(line, "{v}");
        }
        AttrValue::Uint(v) => {
            let _ = write!(line, "{v}");
        }
        AttrValue::Float(v) => {
            let _ = write!(line, "{v}");
        }
        AttrValue::String(v) => push_text_string(line, v),
        AttrValue::Group(_) | AttrValue::Json(_) => {
            push_text_string(line, &serde_json::to_string(value).unwrap_or_default());
        }
    }
}

fn push_text_string(line: &mut String, value: &str) {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '=' || c == '"');
    if needs_quotes {
        let _ = write!(line, "{value:?}");
    } else {
        line.push_str(value);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{Field, FieldRegistry, FieldValue, Level, LogContext, Record, Source, assemble};

    fn sample(level: Level) -> AssembledRecord {
        let registry = FieldRegistry::new();
        let ctx = LogContext::new().attach(&registry, "user", "alice smith");
        let fields = [
            Field::new("code", 7),
            Field::new("req", FieldValue::group([Field::new("id", "r-1"), Field::new("ok", true)])),
        ];
        let err = io::Error::other("disk full");
        let mut record = Record::new(level, "request done")
            .with_fields(&fields)
            .with_time(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
            .with_source(Source::new("/srv/app/src/main.rs", 42));
        if level.is_error_tier() {
            record = record.with_error(Some(&err));
        }
        assemble(&registry, &ctx, &record)
    }

    #[test]
    fn test_json_encoding_order() {
        let line = Format::Json.encode(&sample(Level::Error)).unwrap();
        let line = String::from_utf8(line).unwrap();

        assert_eq!(
            line,
            concat!(
                r#"{"time":"2024-05-01T12:00:00Z","level":"ERROR","source":"src/main.rs:42","#,
                r#""message":"request done","error":"disk full","code":7,"#,
                r#""req":{"id":"r-1","ok":true},"user":"alice smith"}"#,
                "\n"
            )
        );
    }

    #[test]
    fn test_text_encoding() {
        let line = Format::Text.encode(&sample(Level::Info)).unwrap();
        let line = String::from_utf8(line).unwrap();

        assert_eq!(
            line,
            "time=2024-05-01T12:00:00Z level=INFO source=src/main.rs:42 message=\"request done\" \
             code=7 req.id=r-1 req.ok=true user=\"alice smith\"\n"
        );
    }

    #[test]
    fn test_text_quotes_empty_strings() {
        let mut line = String::new();
        push_text_attribute(&mut line, "", &Attribute::new("error", ""));
        assert_eq!(line, r#"error="""#);
    }

    #[test]
    fn test_text_quotes_ambiguous_keys() {
        let mut line = String::new();
        push_text_attribute(&mut line, "", &Attribute::new("user name", "alice"));
        push_text_attribute(&mut line, "", &Attribute::new("a=b", AttrValue::Int(1)));
        push_text_attribute(
            &mut line,
            "",
            &Attribute::new("req", AttrValue::Group(vec![Attribute::new("my id", "r-1")])),
        );
        assert_eq!(line, r#""user name"=alice "a=b"=1 "req.my id"=r-1"#);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("text".parse::<Format>().unwrap(), Format::Text);
        assert!("xml".parse::<Format>().is_err());
    }

    #[test]
    fn test_writer_sink_concurrent_lines_do_not_interleave() {
        let sink = Arc::new(WriterSink::new(Vec::new(), Format::Json));
        let record = Arc::new(sample(Level::Warn));

        let handles = (0..8)
            .map(|_| {
                let sink = Arc::clone(&sink);
                let record = Arc::clone(&record);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        sink.write(&record).unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        let output = Arc::try_unwrap(sink).unwrap().into_inner();
        let output = String::from_utf8(output).unwrap();
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 400);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["level"], "WARN");
        }
    }

    #[test]
    fn test_append_file_sink() {
        let path = std::env::temp_dir().join(format!("ambient-log-{}.log", std::process::id()));
        let _ = std::fs::remove_file(&path);

        for _ in 0..2 {
            let sink = WriterSink::append(&path, Format::Text).unwrap();
            sink.write(&sample(Level::Info)).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_missing_directory_fails() {
        let err = WriterSink::append("/nonexistent-dir/ambient.log", Format::Json).unwrap_err();
        assert!(matches!(err, Error::OpenFile { .. }));
    }
}
