use std::{borrow::Cow, fmt, io};

use crate::{AssembledRecord, field::MESSAGE_KEY, sink::Sink};

/// A sink forwarding assembled records to another [`log::Log`] implementation.
///
/// This lets any existing logger, like [`env_logger`] or [`structured-logger`],
/// do the encoding. The message becomes the record's arguments; every other
/// attribute, `time`, `level` and `source` included, is handed over as a
/// key-value pair in assembled order, with the error first at error tier.
/// `FATAL` and `PANIC` are forwarded at [`log::Level::Error`], with the
/// original name in the `level` pair.
///
/// What ends up in the output is up to the inner logger. Some loggers reorder
/// the pairs or add and overwrite keys of their own: [`structured-logger`]
/// sorts keys, adds `target` and `timestamp`, and writes its own `level`. Use
/// [`WriterSink`](crate::WriterSink) when the exact record shape matters.
///
/// # Example
///
/// ```
/// use ambient_log::{LogContext, LogSink, Logger};
///
/// let logger = Logger::new(LogSink::new(env_logger::builder().build()));
/// logger.info(&LogContext::new(), "Forwarded to env_logger");
/// ```
///
/// [`env_logger`]: https://docs.rs/env_logger/latest/env_logger
/// [`structured-logger`]: https://docs.rs/structured-logger/latest/structured_logger
pub struct LogSink {
    target: Cow<'static, str>,
    inner: Box<dyn log::Log>,
}

impl LogSink {
    pub fn new<L>(inner: L) -> Self
    where
        L: log::Log + 'static,
    {
        Self {
            target: Cow::Borrowed(env!("CARGO_CRATE_NAME")),
            inner: Box::new(inner),
        }
    }

    /// Sets the target of forwarded records.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<Cow<'static, str>>) -> Self {
        self.target = target.into();
        self
    }
}

impl Sink for LogSink {
    fn write(&self, record: &AssembledRecord) -> io::Result<()> {
        let level = record.level().to_log_level();
        let message = record.message().unwrap_or_default();
        let attributes = Attributes(record);

        self.inner.log(
            &log::Record::builder()
                .level(level)
                .target(&self.target)
                .args(format_args!("{message}"))
                .key_values(&attributes)
                .build(),
        );
        Ok(())
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

struct Attributes<'a>(&'a AssembledRecord);

impl log::kv::Source for Attributes<'_> {
    fn visit<'kvs>(
        &'kvs self,
        visitor: &mut dyn log::kv::VisitSource<'kvs>,
    ) -> Result<(), log::kv::Error> {
        for attribute in self.0.attributes().filter(|attribute| attribute.key != MESSAGE_KEY) {
            visitor.visit_pair(
                log::kv::Key::from_str(&attribute.key),
                attribute.value.as_log_value(),
            )?;
        }
        Ok(())
    }
}
