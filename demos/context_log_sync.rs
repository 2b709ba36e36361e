use ambient_log::{Field, Format, Level, LogContext, Logger, WriterSink};

fn main() {
    let logger = Logger::new(WriterSink::stdout(Format::Text)).with_min_level(Level::Debug);

    let ctx = logger.with_field(&LogContext::new(), "user_id", "12345");
    logger.info(&ctx, "Logging in");

    {
        // A derived context leaves `ctx` untouched.
        let ctx = logger.with_field(&ctx, "action", "login");
        logger.debug_with_fields(&ctx, "Checking credentials", &[Field::new("attempt", 1)]);
        logger.info(&ctx, "User logged in successfully");
    }

    let err = std::io::Error::other("profile service unavailable");
    logger.error(&ctx, "Login completed with errors", Some(&err));
}
