use ambient_log::{Error, LogContext, Logger};
use pretty_assertions::assert_eq;

use crate::common::MemorySink;

pub mod common;

#[test]
fn test_failed_init_leaves_nothing_installed() {
    log::set_boxed_logger(Box::new(env_logger::builder().build())).unwrap();

    let sink = MemorySink::default();
    for _ in 0..2 {
        // A retry fails for the same reason, not as already initialized.
        let err = ambient_log::try_init(Logger::new(sink.clone())).unwrap_err();
        assert!(matches!(err, Error::SetLogger(_)), "{err}");
    }

    // The default logger is still created lazily and writes to its own sink.
    ambient_log::info(&LogContext::new(), "lazily configured");
    assert_eq!(sink.records().len(), 0);
}
