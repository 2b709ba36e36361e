//! # Overview
//!
#![doc = include_utils::include_md!("README.md:description")]
//!
//! Every record is assembled from three places:
//!
//! - A fixed header: `time`, `level`, `source` and `message`.
//! - Fields attached to the caller's [`LogContext`] through the logger's
//!   [`FieldRegistry`].
//! - Fields passed at the call site, which win over context fields with the
//!   same key.
//!
//! Error-tier records (`ERROR`, `FATAL`, `PANIC`) always carry an `error`
//! field right after the header. The remaining fields are sorted by key, and
//! each key appears once. The assembled record is handed to a [`Sink`], which
//! encodes it as JSON or text, or forwards it to any [`log::Log`]
//! implementation through [`LogSink`].
//!
//! ## Basic example
//!
#![doc = include_utils::include_md!("README.md:basic_example")]
//!
//! ## Async Context Propagation
//!
#![doc = include_utils::include_md!("README.md:async_example")]

pub use self::{
    assemble::{AssembledRecord, Record, assemble},
    attribute::{AttrValue, Attribute},
    config::{Config, FILE_ENV, FORMAT_ENV, LEVEL_ENV},
    context::LogContext,
    error::Error,
    field::{ERROR_KEY, Field, FieldKey, HEADER_KEYS, LEVEL_KEY, MESSAGE_KEY, SOURCE_KEY, TIME_KEY},
    format::{Source, canonicalize, format_duration, format_timestamp, rewrite_special},
    future::FutureExt,
    global::{
        debug, debug_with_fields, emit, error, error_with_fields, fatal, fatal_with_fields, info,
        info_with_fields, init, logger, panic, panic_with_fields, trace, trace_with_fields,
        try_init, warn, warn_with_fields, with_field,
    },
    level::Level,
    log_sink::LogSink,
    logger::{Logger, Termination},
    registry::FieldRegistry,
    sink::{Format, Sink, WriterSink},
    value::FieldValue,
};

mod assemble;
mod attribute;
mod config;
mod context;
mod error;
mod field;
mod format;
pub mod future;
mod global;
pub mod guard;
mod level;
mod log_sink;
mod logger;
mod registry;
mod sink;
mod stack;
mod value;
