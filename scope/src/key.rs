use std::{fmt, marker::PhantomData};

/// Named handle for a binding of type `T`.
///
/// Keys are usually declared as constants next to the service they bind:
///
/// ```
/// # use depot_scope::Key;
/// pub const PAGE_SIZE: Key<usize> = Key::new("page-size");
/// ```
pub struct Key<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_tuple("Key")
            .field(&self.name)
            .finish()
    }
}
