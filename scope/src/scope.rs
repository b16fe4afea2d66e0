use crate::{
    BoxError, Error, Key, Result,
    teardown::{self, TeardownError, TeardownFn},
};
use futures::FutureExt;
use std::{
    any::Any,
    collections::HashMap,
    future::Future,
    panic::AssertUnwindSafe,
    sync::{
        Arc, Mutex, PoisonError, RwLock,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

type Binding = Arc<dyn Any + Send + Sync>;

/// Failure of a scoped operation.
#[derive(thiserror::Error, Debug)]
pub enum ScopeError<E> {
    /// The scoped body failed. Teardown still ran; if it also failed, that
    /// failure is attached here instead of replacing the body's error.
    #[error("{error}")]
    Body {
        error: E,
        teardown: Option<TeardownError>,
    },

    /// The body succeeded but releasing the scope did not.
    #[error(transparent)]
    Teardown(TeardownError),

    /// The parent was already closed; the body never ran.
    #[error(transparent)]
    Closed(Error),
}

impl<E> ScopeError<E> {
    pub fn teardown(&self) -> Option<&TeardownError> {
        match self {
            ScopeError::Body { teardown, .. } => teardown.as_ref(),
            ScopeError::Teardown(err) => Some(err),
            ScopeError::Closed(_) => None,
        }
    }
}

/// A nestable execution context.
///
/// Cloning a `Scope` yields another handle to the same context.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<Inner>,
}

struct Inner {
    id: u64,
    depth: usize,
    parent: Option<Scope>,
    bindings: RwLock<HashMap<&'static str, Binding>>,
    teardowns: Mutex<Vec<TeardownFn>>,
    open_children: AtomicUsize,
    closed: AtomicBool,
}

impl Scope {
    fn new(parent: Option<Scope>) -> Self {
        let depth = parent
            .as_ref()
            .map(|p| p.depth() + 1)
            .unwrap_or(0);

        let scope = Self {
            inner: Arc::new(Inner {
                id: NEXT_SCOPE_ID.fetch_add(1, Ordering::SeqCst),
                depth,
                parent,
                bindings: RwLock::new(HashMap::new()),
                teardowns: Mutex::new(Vec::new()),
                open_children: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
            }),
        };

        tracing::debug!(
            scope = scope.id(),
            parent = ?scope.parent().map(Scope::id),
            depth,
            "opened scope"
        );

        scope
    }

    /// Creates a scope with no parent.
    pub fn root() -> Self {
        Self::new(None)
    }

    /// Opens a child scope. The caller is responsible for [`Scope::close`];
    /// prefer [`Scope::enter`] which pairs the two.
    pub fn fork(&self) -> Result<Self> {
        if self.is_closed() {
            return Err(Error::Closed { id: self.id() });
        }

        self.inner
            .open_children
            .fetch_add(1, Ordering::SeqCst);
        Ok(Self::new(Some(self.clone())))
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.inner.parent.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Creates or replaces `key` in this scope only. Ignored once the scope
    /// is closed.
    pub fn set<T>(
        &self,
        key: &Key<T>,
        value: T,
    ) where
        T: Clone + Send + Sync + 'static, {
        if self.is_closed() {
            tracing::warn!(
                scope = self.id(),
                key = key.name(),
                "ignoring binding on a closed scope"
            );
            return;
        }

        self.inner
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.name(), Arc::new(value));
    }

    /// Resolves `key`, walking from this scope towards the root.
    pub fn get<T>(
        &self,
        key: &Key<T>,
    ) -> Option<T>
    where
        T: Clone + 'static, {
        let mut current = Some(self);

        while let Some(scope) = current {
            let found = scope
                .inner
                .bindings
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(key.name())
                .cloned();

            if let Some(binding) = found {
                return match binding.downcast_ref::<T>() {
                    Some(value) => Some(value.clone()),
                    None => {
                        tracing::warn!(
                            scope = scope.id(),
                            key = key.name(),
                            "binding has an unexpected type"
                        );
                        None
                    },
                };
            }

            current = scope.parent();
        }

        None
    }

    /// Like [`Scope::get`], failing with [`Error::MissingBinding`].
    pub fn require<T>(
        &self,
        key: &Key<T>,
    ) -> Result<T>
    where
        T: Clone + 'static, {
        self.get(key)
            .ok_or(Error::MissingBinding { name: key.name() })
    }

    pub fn contains<T>(
        &self,
        key: &Key<T>,
    ) -> bool
    where
        T: Clone + 'static, {
        self.get(key).is_some()
    }

    /// Adds a callback to this scope's release list.
    pub fn register_teardown<F, Fut, E>(
        &self,
        callback: F,
    ) -> Result<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<(), E>> + Send + 'static,
        E: Into<BoxError>, {
        if self.is_closed() {
            return Err(Error::Closed { id: self.id() });
        }

        let callback: TeardownFn = Box::new(move || {
            async move { callback().await.map_err(Into::into) }.boxed()
        });

        self.inner
            .teardowns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);

        Ok(())
    }

    /// Releases this scope: runs teardown callbacks in reverse registration
    /// order and drops the scope's own bindings. Closing twice is a no-op.
    pub async fn close(&self) -> std::result::Result<(), TeardownError> {
        if self
            .inner
            .closed
            .swap(true, Ordering::SeqCst)
        {
            return Ok(());
        }

        let open = self
            .inner
            .open_children
            .load(Ordering::SeqCst);
        if open > 0 {
            tracing::warn!(
                scope = self.id(),
                open,
                "closing scope with child scopes still open"
            );
        }

        let callbacks = std::mem::take(
            &mut *self
                .inner
                .teardowns
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let count = callbacks.len();

        let released = teardown::release(self.id(), callbacks).await;

        self.inner
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        if let Some(parent) = self.parent() {
            parent
                .inner
                .open_children
                .fetch_sub(1, Ordering::SeqCst);
        }

        tracing::debug!(scope = self.id(), teardowns = count, "closed scope");

        released
    }

    /// Runs `body` in a fresh child scope and closes that scope before
    /// returning, on success, on error and on panic alike. A panic is resumed
    /// once teardown has completed.
    pub async fn enter<F, Fut, T, E>(
        &self,
        body: F,
    ) -> std::result::Result<T, ScopeError<E>>
    where
        F: FnOnce(Scope) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>, {
        let child = self.fork().map_err(ScopeError::Closed)?;

        let scoped = child.clone();
        let outcome = AssertUnwindSafe(async move { body(scoped).await })
            .catch_unwind()
            .await;

        let teardown = child.close().await.err();

        match outcome {
            Ok(Ok(value)) => {
                match teardown {
                    None => Ok(value),
                    Some(err) => Err(ScopeError::Teardown(err)),
                }
            },
            Ok(Err(error)) => Err(ScopeError::Body { error, teardown }),
            Err(panic) => {
                if let Some(err) = teardown {
                    tracing::error!(
                        scope = child.id(),
                        "teardown failed while unwinding: {err}"
                    );
                }
                std::panic::resume_unwind(panic)
            },
        }
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id())
            .field("depth", &self.depth())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: Key<String> = Key::new("name");
    const COUNT: Key<usize> = Key::new("count");

    #[test]
    fn lookup_walks_to_root() {
        let root = Scope::root();
        root.set(&NAME, "root".to_string());

        let child = root.fork().unwrap();
        let grandchild = child.fork().unwrap();

        assert_eq!(grandchild.get(&NAME).as_deref(), Some("root"));
        assert_eq!(grandchild.depth(), 2);
    }

    #[test]
    fn set_only_touches_current_scope() {
        let root = Scope::root();
        root.set(&NAME, "root".to_string());

        let child = root.fork().unwrap();
        child.set(&NAME, "child".to_string());
        child.set(&COUNT, 3);

        assert_eq!(child.get(&NAME).as_deref(), Some("child"));
        assert_eq!(root.get(&NAME).as_deref(), Some("root"));
        assert!(!root.contains(&COUNT));
    }

    #[test]
    fn mismatched_type_resolves_to_none() {
        const AS_COUNT: Key<usize> = Key::new("name");

        let root = Scope::root();
        root.set(&NAME, "root".to_string());

        assert_eq!(root.get(&AS_COUNT), None);
    }

    #[test]
    fn require_names_missing_key() {
        let root = Scope::root();
        let err = root.require(&COUNT).unwrap_err();

        assert!(matches!(err, Error::MissingBinding { name: "count" }));
    }

    #[tokio::test]
    async fn closed_scope_rejects_bindings_and_children() {
        let root = Scope::root();
        root.set(&NAME, "root".to_string());
        root.close().await.unwrap();

        root.set(&NAME, "revived".to_string());

        assert!(!root.contains(&NAME));
        assert!(matches!(root.fork(), Err(Error::Closed { .. })));
    }
}
