use std::{io, path::PathBuf};

/// Errors produced while configuring or installing a logger.
///
/// Nothing on the logging path itself returns an error: records that cannot
/// be written are dropped.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown log level `{0}`")]
    ParseLevel(String),
    #[error("unknown log format `{0}`, expected `json` or `text`")]
    ParseFormat(String),
    #[error("failed to open log file `{}`", path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("global logger is already initialized")]
    AlreadyInitialized,
    #[error(transparent)]
    SetLogger(#[from] log::SetLoggerError),
}
