use std::{borrow::Cow, error::Error as StdError, fmt, sync::Arc};

use crate::{
    Field, FieldValue, Level, LogContext,
    assemble::{Record, assemble},
    config::Config,
    field::FieldKey,
    format::Source,
    registry::FieldRegistry,
    sink::Sink,
};

/// A structured logger that merges ambient context fields into every record.
///
/// Each call assembles a record from the fields attached to the given
/// [`LogContext`] and the fields passed at the call site, then hands it to a
/// single [`Sink`]. Context fields are only visible if they were attached
/// through this logger's [`FieldRegistry`], see [`Logger::with_field`].
///
/// # Example
///
/// ```
/// use ambient_log::{Field, Format, LogContext, Logger, WriterSink};
///
/// let logger = Logger::new(WriterSink::stdout(Format::Json));
///
/// let ctx = logger.with_field(&LogContext::new(), "request_id", "req-123");
/// logger.info(&ctx, "request accepted"); // includes request_id="req-123"
/// logger.warn_with_fields(&ctx, "slow request", &[Field::new("elapsed_ms", 1500)]);
/// ```
///
/// The logger also implements [`log::Log`], so records emitted through the
/// [`log`] macros are assembled against the thread's current context (see
/// [`LogContext::enter`]).
pub struct Logger {
    registry: Arc<FieldRegistry>,
    sink: Box<dyn Sink>,
    min_level: Level,
}

/// What the caller must do after a `FATAL` or `PANIC` record was emitted.
///
/// The outcome does not depend on whether the record was actually written.
#[must_use = "the process is only terminated by calling `terminate`"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Exit the process with the given status code.
    Exit { code: i32 },
    /// Raise a panic with the given message.
    Panic { message: String },
}

impl Termination {
    /// Performs the termination.
    ///
    /// # Panics
    ///
    /// Panics with the carried message for [`Termination::Panic`].
    #[track_caller]
    pub fn terminate(self) -> ! {
        match self {
            Self::Exit { code } => std::process::exit(code),
            Self::Panic { message } => panic!("{message}"),
        }
    }
}

impl Logger {
    /// Creates a logger writing to `sink` at the default `INFO` level with a
    /// fresh field registry.
    pub fn new<S>(sink: S) -> Self
    where
        S: Sink + 'static,
    {
        Self {
            registry: Arc::default(),
            sink: Box::new(sink),
            min_level: Level::default(),
        }
    }

    /// Creates a logger configured from `LOG_LEVEL`, `LOG_FORMAT` and `LOG_FILE`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_config(&Config::from_env())
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.open_sink()).with_min_level(config.level)
    }

    /// Sets the minimum level of emitted records.
    #[must_use]
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Uses a shared field registry, so contexts built through another logger
    /// contribute their fields here as well.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<FieldRegistry>) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<FieldRegistry> {
        &self.registry
    }

    #[must_use]
    pub const fn min_level(&self) -> Level {
        self.min_level
    }

    /// Returns `true` if records at `level` would be emitted.
    #[must_use]
    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    /// Returns a context derived from `ctx` carrying one more field.
    ///
    /// The original context is left untouched.
    #[must_use]
    pub fn with_field(
        &self,
        ctx: &LogContext,
        key: impl Into<FieldKey>,
        value: impl Into<FieldValue>,
    ) -> LogContext {
        ctx.attach(&self.registry, key, value)
    }

    /// Assembles and writes `record` if its level is enabled.
    ///
    /// Records without a source get the caller's location. Write failures
    /// drop the record and are reported on stderr.
    #[track_caller]
    pub fn emit(&self, ctx: &LogContext, mut record: Record<'_>) {
        if !self.is_enabled(record.level) {
            return;
        }
        if record.source.is_none() {
            record.source = Some(Source::caller());
        }
        self.write(ctx, &record);
    }

    fn write(&self, ctx: &LogContext, record: &Record<'_>) {
        let assembled = assemble(&self.registry, ctx, record);
        if let Err(err) = self.sink.write(&assembled) {
            // Logging about a failed log write through the same sink would fail too.
            eprintln!("failed to write {} record: {err}", assembled.level());
        }
    }

    #[track_caller]
    fn log_fields(&self, ctx: &LogContext, level: Level, message: &str, fields: &[Field]) {
        if self.is_enabled(level) {
            let record = Record::new(level, message)
                .with_fields(fields)
                .with_source(Source::caller());
            self.write(ctx, &record);
        }
    }

    #[track_caller]
    fn log_error(
        &self,
        ctx: &LogContext,
        level: Level,
        message: &str,
        err: Option<&dyn StdError>,
        fields: &[Field],
    ) {
        if self.is_enabled(level) {
            let record = Record::new(level, message)
                .with_fields(fields)
                .with_error(err)
                .with_source(Source::caller());
            self.write(ctx, &record);
        }
    }

    #[track_caller]
    pub fn trace(&self, ctx: &LogContext, message: &str) {
        self.log_fields(ctx, Level::Trace, message, &[]);
    }

    #[track_caller]
    pub fn trace_with_fields(&self, ctx: &LogContext, message: &str, fields: &[Field]) {
        self.log_fields(ctx, Level::Trace, message, fields);
    }

    #[track_caller]
    pub fn debug(&self, ctx: &LogContext, message: &str) {
        self.log_fields(ctx, Level::Debug, message, &[]);
    }

    #[track_caller]
    pub fn debug_with_fields(&self, ctx: &LogContext, message: &str, fields: &[Field]) {
        self.log_fields(ctx, Level::Debug, message, fields);
    }

    #[track_caller]
    pub fn info(&self, ctx: &LogContext, message: &str) {
        self.log_fields(ctx, Level::Info, message, &[]);
    }

    #[track_caller]
    pub fn info_with_fields(&self, ctx: &LogContext, message: &str, fields: &[Field]) {
        self.log_fields(ctx, Level::Info, message, fields);
    }

    #[track_caller]
    pub fn warn(&self, ctx: &LogContext, message: &str) {
        self.log_fields(ctx, Level::Warn, message, &[]);
    }

    #[track_caller]
    pub fn warn_with_fields(&self, ctx: &LogContext, message: &str, fields: &[Field]) {
        self.log_fields(ctx, Level::Warn, message, fields);
    }

    /// Emits an `ERROR` record whose first field is the rendered `err`.
    ///
    /// A missing error still produces an empty `error` field.
    #[track_caller]
    pub fn error(&self, ctx: &LogContext, message: &str, err: Option<&dyn StdError>) {
        self.log_error(ctx, Level::Error, message, err, &[]);
    }

    #[track_caller]
    pub fn error_with_fields(
        &self,
        ctx: &LogContext,
        message: &str,
        err: Option<&dyn StdError>,
        fields: &[Field],
    ) {
        self.log_error(ctx, Level::Error, message, err, fields);
    }

    /// Emits a `FATAL` record and returns [`Termination::Exit`] with status 1.
    #[track_caller]
    pub fn fatal(&self, ctx: &LogContext, message: &str, err: Option<&dyn StdError>) -> Termination {
        self.fatal_with_fields(ctx, message, err, &[])
    }

    #[track_caller]
    pub fn fatal_with_fields(
        &self,
        ctx: &LogContext,
        message: &str,
        err: Option<&dyn StdError>,
        fields: &[Field],
    ) -> Termination {
        self.log_error(ctx, Level::Fatal, message, err, fields);
        self.sink.flush();
        Termination::Exit { code: 1 }
    }

    /// Emits a `PANIC` record and returns [`Termination::Panic`] carrying the
    /// error text, or the message when there is no error.
    #[track_caller]
    pub fn panic(&self, ctx: &LogContext, message: &str, err: Option<&dyn StdError>) -> Termination {
        self.panic_with_fields(ctx, message, err, &[])
    }

    #[track_caller]
    pub fn panic_with_fields(
        &self,
        ctx: &LogContext,
        message: &str,
        err: Option<&dyn StdError>,
        fields: &[Field],
    ) -> Termination {
        self.log_error(ctx, Level::Panic, message, err, fields);
        self.sink.flush();
        Termination::Panic {
            message: err.map_or_else(|| message.to_owned(), ToString::to_string),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.is_enabled(metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        let level = Level::from(record.level());
        if !self.is_enabled(level) {
            return;
        }

        let mut fields = FieldCollector(Vec::new());
        // Collecting into a vector cannot fail; a broken source just yields fewer fields.
        let _ = record.key_values().visit(&mut fields);

        let message = record
            .args()
            .as_str()
            .map_or_else(|| Cow::Owned(record.args().to_string()), Cow::Borrowed);
        let mut assembled = Record::new(level, message).with_fields(&fields.0);
        if let (Some(file), Some(line)) = (record.file(), record.line()) {
            assembled = assembled.with_source(Source::new(file, line));
        }

        self.write(&LogContext::current(), &assembled);
    }

    fn flush(&self) {
        self.sink.flush();
    }
}

struct FieldCollector(Vec<Field>);

impl<'kvs> log::kv::VisitSource<'kvs> for FieldCollector {
    fn visit_pair(
        &mut self,
        key: log::kv::Key<'kvs>,
        value: log::kv::Value<'kvs>,
    ) -> Result<(), log::kv::Error> {
        self.0.push(Field::new(key.as_str().to_owned(), field_value(&value)));
        Ok(())
    }
}

fn field_value(value: &log::kv::Value<'_>) -> FieldValue {
    if let Some(v) = value.to_bool() {
        v.into()
    } else if let Some(v) = value.to_i64() {
        v.into()
    } else if let Some(v) = value.to_u64() {
        v.into()
    } else if let Some(v) = value.to_f64() {
        v.into()
    } else {
        value.to_string().into()
    }
}
