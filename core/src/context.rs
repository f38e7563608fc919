//! Context threaded through the pre-processor chain into the handler.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::command::Command;

/// Key under which the root command is stored.
pub const ROOT_KEY: &str = "root";

/// A pre-processor: receives the command it is declared on and the current
/// context, and returns a replacement context or `None` to leave it as is.
pub type PreProcessor =
    Arc<dyn Fn(&Command, &Context) -> anyhow::Result<Option<Context>> + Send + Sync>;

type Entry = Arc<dyn Any + Send + Sync>;

/// Immutable string-keyed map of opaque values.
///
/// [`with`](Context::with) returns a new map; the receiver is unchanged.
///
/// # Examples
///
/// ```
/// use command_tree_core::Context;
///
/// let empty = Context::new();
/// let ctx = empty.with("user", String::from("ada")).with("retries", 3u32);
///
/// assert_eq!(ctx.get::<String>("user").map(String::as_str), Some("ada"));
/// assert_eq!(ctx.get::<u32>("retries"), Some(&3));
/// assert_eq!(ctx.get::<i64>("retries"), None);
/// assert!(empty.is_empty());
/// ```
#[derive(Clone, Default)]
pub struct Context {
    entries: Arc<BTreeMap<String, Entry>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this context with `key` set to `value`.
    pub fn with<T: Any + Send + Sync>(&self, key: &str, value: T) -> Context {
        let mut next = self.clone();
        Arc::make_mut(&mut next.entries).insert(key.to_string(), Arc::new(value));
        next
    }

    /// Returns the value under `key` if it exists and has type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.entries.get(key)?.downcast_ref::<T>()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The top-level command of the current run.
    pub fn root(&self) -> Option<&Command> {
        self.get::<Command>(ROOT_KEY)
    }

    /// Stores `root` under [`ROOT_KEY`] unless something is already there.
    pub(crate) fn with_root(self, root: &Command) -> Context {
        if self.contains(ROOT_KEY) {
            self
        } else {
            self.with(ROOT_KEY, root.clone())
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_does_not_touch_receiver() {
        let base = Context::new().with("p", 1i32);
        let next = base.with("p", 2i32);
        assert_eq!(base.get::<i32>("p"), Some(&1));
        assert_eq!(next.get::<i32>("p"), Some(&2));
    }

    #[test]
    fn test_with_root_is_idempotent() {
        let first = Command::new("first");
        let second = Command::new("second");
        let ctx = Context::new().with_root(&first).with_root(&second);
        assert_eq!(ctx.root().map(Command::name), Some("first"));
        assert_eq!(ctx.len(), 1);
    }
}
