use std::time::Duration;

use ambient_log::{FieldValue, Format, FutureExt, Level, LogContext, Logger, WriterSink};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Operation {
    action: String,
    name: String,
}

fn try_init_logger() -> Result<(), Box<dyn std::error::Error>> {
    let level = Level::Info;

    ambient_log::try_init(Logger::new(WriterSink::stdout(Format::Json)).with_min_level(level))?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    try_init_logger()?;

    let root = ambient_log::with_field(&LogContext::new(), "instance", "context_log_async");
    ambient_log::info(&root, "Initialized ambient logger");

    let log_context = ambient_log::with_field(&root, "user_id", "12345");
    let first_future = async move {
        log::info!("Logging in");
        // Nested contexts extend the one the future runs in.
        let log_context = ambient_log::with_field(
            &LogContext::current(),
            "action",
            FieldValue::serde(Operation {
                action: "login".to_owned(),
                name: "user".to_owned(),
            }),
        );
        async move {
            log::info!("User logged in successfully");
            tokio::task::yield_now().await;
        }
        .in_log_context(log_context)
        .await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        log::info!(elapsed:? = Duration::from_millis(100); "Login completed");
    }
    .in_log_context(log_context);

    let log_context = ambient_log::with_field(&root, "name", "Alice");
    let log_context = ambient_log::with_field(&log_context, "age", 25);
    let log_context = ambient_log::with_field(&log_context, "married", true);
    let second_future = async move {
        tokio::task::yield_now().await;

        log::info!("Another future pending");
        tokio::time::sleep(Duration::from_millis(100)).await;
        log::info!("Future completed");
    }
    .in_log_context(log_context);

    let log_context = ambient_log::with_field(&root, "name", "Bob");
    let third_future = tokio::spawn(
        async move {
            tokio::task::yield_now().await;

            log::info!("Third future pending");
            tokio::time::sleep(Duration::from_millis(100)).await;

            let err = std::io::Error::other("session expired");
            ambient_log::error(&LogContext::current(), "Third future failed", Some(&err));
        }
        .in_log_context(log_context),
    );

    let ((), (), res) = tokio::join!(first_future, second_future, third_future);
    res?;

    ambient_log::info_with_fields(
        &root,
        "Last call completed",
        &[ambient_log::Field::new("uptime", Duration::from_millis(300))],
    );

    Ok(())
}
