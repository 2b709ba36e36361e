//! A current logging context guard.

use std::marker::PhantomData;

use crate::{
    LogContext,
    stack::{CONTEXT_STACK, ContextStack},
};

/// A guard representing the current logging context on this thread.
///
/// When the guard is dropped, the context is removed from the thread's
/// context stack. This is returned by the [`LogContext::enter`] method.
///
/// # Examples
///
/// ```
/// use ambient_log::{FieldRegistry, LogContext};
///
/// let registry = FieldRegistry::new();
/// let context = LogContext::new().attach(&registry, "user_id", 123);
///
/// let guard = context.enter();
/// assert!(LogContext::current().lookup("user_id").is_some());
///
/// drop(guard);
/// assert!(LogContext::current().lookup("user_id").is_none());
/// ```
#[non_exhaustive]
#[derive(Debug)]
pub struct LogContextGuard<'a> {
    // Make this guard unsendable.
    _marker: PhantomData<&'a *mut ()>,
}

impl LogContextGuard<'_> {
    pub(crate) fn enter(context: LogContext) -> Self {
        CONTEXT_STACK.with(|stack| stack.push(context));
        Self {
            _marker: PhantomData,
        }
    }
}

impl Drop for LogContextGuard<'_> {
    fn drop(&mut self) {
        // The stack may already be gone during thread teardown.
        let _ = CONTEXT_STACK.try_with(ContextStack::pop);
    }
}
