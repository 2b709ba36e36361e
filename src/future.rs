//! Context propagation across `.await` points.

use std::task::Poll;

use pin_project::pin_project;

use crate::{LogContext, guard::LogContextGuard};

/// Extension trait that runs a future inside a [`LogContext`].
pub trait FutureExt: Future + Sized {
    /// Enters `context` every time the returned future is polled, so records
    /// emitted through the [`log`] macros inside it carry the context fields
    /// no matter which thread polls it.
    fn in_log_context(self, context: LogContext) -> LogContextFuture<Self>;
}

impl<F> FutureExt for F
where
    F: Future,
{
    fn in_log_context(self, context: LogContext) -> LogContextFuture<Self> {
        LogContextFuture {
            inner: self,
            context,
        }
    }
}

#[pin_project]
#[derive(Debug)]
pub struct LogContextFuture<F> {
    #[pin]
    inner: F,
    context: LogContext,
}

impl<F> Future for LogContextFuture<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: std::pin::Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        let _guard = LogContextGuard::enter(this.context.clone());
        this.inner.poll(cx)
    }
}
