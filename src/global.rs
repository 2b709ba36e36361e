//! The process-wide default logger and free functions over it.

use std::{error::Error as StdError, sync::OnceLock};

use crate::{Error, Field, FieldValue, LogContext, Logger, Record, field::FieldKey};

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// The [`log`] crate logger, forwarding to the default logger once it is set.
struct DefaultLog;

impl log::Log for DefaultLog {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        LOGGER
            .get()
            .is_some_and(|logger| log::Log::enabled(logger, metadata))
    }

    fn log(&self, record: &log::Record) {
        if let Some(logger) = LOGGER.get() {
            log::Log::log(logger, record);
        }
    }

    fn flush(&self) {
        if let Some(logger) = LOGGER.get() {
            log::Log::flush(logger);
        }
    }
}

/// Installs `logger` as the process-wide default logger.
///
/// The logger is also installed as the [`log`] crate logger, so records
/// emitted through the [`log`] macros go through it as well.
///
/// # Panics
///
/// Panics if a default logger has already been set, or created implicitly by
/// [`logger`].
pub fn init(logger: Logger) {
    try_init(logger).expect("ambient_log::init should not be called after logger initialization");
}

/// Installs `logger` as the process-wide default logger.
///
/// Nothing is installed when an error is returned, so a failed call can be
/// retried.
///
/// # Errors
///
/// - [`Error::AlreadyInitialized`] if a default logger has already been set,
///   or created implicitly by [`logger`].
/// - [`Error::SetLogger`] if another [`log`] crate logger is installed.
pub fn try_init(logger: Logger) -> Result<(), Error> {
    if LOGGER.get().is_some() {
        return Err(Error::AlreadyInitialized);
    }
    let max_level = logger.min_level().to_log_filter();

    log::set_logger(&DefaultLog)?;
    LOGGER.set(logger).map_err(|_| Error::AlreadyInitialized)?;
    log::set_max_level(max_level);
    Ok(())
}

/// Returns the default logger.
///
/// Without a prior [`init`], a logger configured from the environment is
/// created on first use. Such a logger is not installed as the [`log`] crate
/// logger.
pub fn logger() -> &'static Logger {
    LOGGER.get_or_init(Logger::from_env)
}

/// Returns a context derived from `ctx` carrying one more field, registered
/// in the default logger's registry.
#[must_use]
pub fn with_field(
    ctx: &LogContext,
    key: impl Into<FieldKey>,
    value: impl Into<FieldValue>,
) -> LogContext {
    logger().with_field(ctx, key, value)
}

#[track_caller]
pub fn emit(ctx: &LogContext, record: Record<'_>) {
    logger().emit(ctx, record);
}

#[track_caller]
pub fn trace(ctx: &LogContext, message: &str) {
    logger().trace(ctx, message);
}

#[track_caller]
pub fn trace_with_fields(ctx: &LogContext, message: &str, fields: &[Field]) {
    logger().trace_with_fields(ctx, message, fields);
}

#[track_caller]
pub fn debug(ctx: &LogContext, message: &str) {
    logger().debug(ctx, message);
}

#[track_caller]
pub fn debug_with_fields(ctx: &LogContext, message: &str, fields: &[Field]) {
    logger().debug_with_fields(ctx, message, fields);
}

#[track_caller]
pub fn info(ctx: &LogContext, message: &str) {
    logger().info(ctx, message);
}

#[track_caller]
pub fn info_with_fields(ctx: &LogContext, message: &str, fields: &[Field]) {
    logger().info_with_fields(ctx, message, fields);
}

#[track_caller]
pub fn warn(ctx: &LogContext, message: &str) {
    logger().warn(ctx, message);
}

#[track_caller]
pub fn warn_with_fields(ctx: &LogContext, message: &str, fields: &[Field]) {
    logger().warn_with_fields(ctx, message, fields);
}

#[track_caller]
pub fn error(ctx: &LogContext, message: &str, err: Option<&dyn StdError>) {
    logger().error(ctx, message, err);
}

#[track_caller]
pub fn error_with_fields(
    ctx: &LogContext,
    message: &str,
    err: Option<&dyn StdError>,
    fields: &[Field],
) {
    logger().error_with_fields(ctx, message, err, fields);
}

/// Emits a `FATAL` record and exits the process with status 1.
#[track_caller]
pub fn fatal(ctx: &LogContext, message: &str, err: Option<&dyn StdError>) -> ! {
    logger().fatal(ctx, message, err).terminate()
}

#[track_caller]
pub fn fatal_with_fields(
    ctx: &LogContext,
    message: &str,
    err: Option<&dyn StdError>,
    fields: &[Field],
) -> ! {
    logger()
        .fatal_with_fields(ctx, message, err, fields)
        .terminate()
}

/// Emits a `PANIC` record and panics with the error text, or the message when
/// there is no error.
///
/// # Panics
///
/// Always.
#[track_caller]
pub fn panic(ctx: &LogContext, message: &str, err: Option<&dyn StdError>) -> ! {
    logger().panic(ctx, message, err).terminate()
}

/// # Panics
///
/// Always, see [`panic()`].
#[track_caller]
pub fn panic_with_fields(
    ctx: &LogContext,
    message: &str,
    err: Option<&dyn StdError>,
    fields: &[Field],
) -> ! {
    logger()
        .panic_with_fields(ctx, message, err, fields)
        .terminate()
}
