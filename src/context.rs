use std::{fmt, sync::Arc};

use crate::{
    FieldValue,
    field::FieldKey,
    guard::LogContextGuard,
    registry::FieldRegistry,
    stack::{CONTEXT_STACK, ContextStack},
};

/// An immutable set of ambient fields attached to an execution context.
///
/// A context is a cheap handle to a chain of bindings. Attaching a field never
/// changes an existing context: it returns a new one that shares its parent's
/// bindings and adds one more on top. Lookups return the most recently
/// attached value for a key, so a child may shadow its parent without the
/// parent, or any other snapshot taken earlier, observing the change.
///
/// # Examples
///
/// ```
/// use ambient_log::{FieldRegistry, LogContext};
///
/// let registry = FieldRegistry::new();
/// let base = LogContext::new().attach(&registry, "user", "alice");
/// let child = base.attach(&registry, "user", "bob");
///
/// assert_eq!(base.lookup("user").and_then(|v| v.as_str()), Some("alice"));
/// assert_eq!(child.lookup("user").and_then(|v| v.as_str()), Some("bob"));
/// ```
#[derive(Clone, Default)]
pub struct LogContext(Option<Arc<ContextNode>>);

struct ContextNode {
    key: FieldKey,
    value: FieldValue,
    parent: LogContext,
}

impl LogContext {
    /// Creates an empty root context.
    #[must_use]
    pub const fn new() -> Self {
        Self(None)
    }

    /// Returns a new context carrying `value` at `key` on top of this one.
    ///
    /// The key is registered in `registry` first, so any logger sharing that
    /// registry will pick the field up when assembling records.
    #[must_use]
    pub fn attach(
        &self,
        registry: &FieldRegistry,
        key: impl Into<FieldKey>,
        value: impl Into<FieldValue>,
    ) -> Self {
        let key = key.into();
        registry.register(&key);

        Self(Some(Arc::new(ContextNode {
            key,
            value: value.into(),
            parent: self.clone(),
        })))
    }

    /// Returns the nearest value attached at `key`, if any.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&FieldValue> {
        self.nodes()
            .find(|node| node.key == key)
            .map(|node| &node.value)
    }

    /// Iterates over the visible fields, most recently attached first.
    ///
    /// Bindings shadowed by a newer one with the same key are skipped.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        let mut seen: Vec<&str> = Vec::new();
        self.nodes().filter_map(move |node| {
            let key: &str = &node.key;
            if seen.contains(&key) {
                return None;
            }
            seen.push(key);
            Some((key, &node.value))
        })
    }

    /// Returns `true` if nothing was ever attached to this context.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Makes this context the current one on this thread until the returned
    /// guard is dropped.
    ///
    /// Records emitted through the [`log`] macros pick up the current context.
    #[must_use]
    pub fn enter<'a>(self) -> LogContextGuard<'a> {
        LogContextGuard::enter(self)
    }

    /// Returns the context most recently entered on this thread, or an empty
    /// context.
    #[must_use]
    pub fn current() -> Self {
        CONTEXT_STACK
            .try_with(ContextStack::top)
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    fn nodes(&self) -> impl Iterator<Item = &ContextNode> {
        std::iter::successors(self.0.as_deref(), |node| node.parent.0.as_deref())
    }
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields()).finish()
    }
}

impl Drop for ContextNode {
    fn drop(&mut self) {
        // Unlink iteratively, long lineages would otherwise recurse once per node.
        let mut parent = self.parent.0.take();
        while let Some(node) = parent {
            match Arc::try_unwrap(node) {
                Ok(mut node) => parent = node.parent.0.take(),
                Err(_) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup_str<'a>(ctx: &'a LogContext, key: &str) -> Option<&'a str> {
        ctx.lookup(key).and_then(FieldValue::as_str)
    }

    #[test]
    fn test_lookup_absent_key() {
        let registry = FieldRegistry::new();
        let ctx = LogContext::new().attach(&registry, "user", "alice");

        assert!(LogContext::new().lookup("user").is_none());
        assert!(ctx.lookup("request_id").is_none());
    }

    #[test]
    fn test_attach_registers_key() {
        let registry = FieldRegistry::new();
        let _ctx = LogContext::new().attach(&registry, "user", "alice");

        assert!(registry.contains("user"));
    }

    #[test]
    fn test_snapshots_are_immutable() {
        let registry = FieldRegistry::new();
        let base = LogContext::new().attach(&registry, "user", "alice");
        let before = base.attach(&registry, "request_id", "r-1");
        let after = base.attach(&registry, "user", "bob");

        assert_eq!(lookup_str(&base, "user"), Some("alice"));
        assert_eq!(lookup_str(&before, "user"), Some("alice"));
        assert_eq!(lookup_str(&after, "user"), Some("bob"));
        assert!(after.lookup("request_id").is_none());
    }

    #[test]
    fn test_fields_skip_shadowed_bindings() {
        let registry = FieldRegistry::new();
        let ctx = LogContext::new()
            .attach(&registry, "a", 1)
            .attach(&registry, "b", 2)
            .attach(&registry, "a", 3);

        let keys = ctx.fields().map(|(key, _)| key).collect::<Vec<_>>();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn test_long_lineage_drops() {
        let registry = FieldRegistry::new();
        let mut ctx = LogContext::new();
        for i in 0..200_000_u32 {
            ctx = ctx.attach(&registry, "depth", i);
        }
        assert_eq!(ctx.lookup("depth").map(|v| format!("{v:?}")), Some("Uint(199999)".to_owned()));
        drop(ctx);
    }

    #[test]
    fn test_context_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LogContext>();
    }
}
