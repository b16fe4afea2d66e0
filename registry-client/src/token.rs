use std::sync::{Arc, PoisonError, RwLock};

/// Supplies the value of the `Authorization` header, consulted per request.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync, {
    fn token(&self) -> Option<String> {
        self()
    }
}

/// A token that never changes.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// A token that can be swapped while clients holding it stay alive.
#[derive(Debug, Clone, Default)]
pub struct SharedToken(Arc<RwLock<Option<String>>>);

impl SharedToken {
    pub fn new(token: Option<String>) -> Self {
        Self(Arc::new(RwLock::new(token)))
    }

    pub fn set(
        &self,
        token: Option<String>,
    ) {
        *self
            .0
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }
}

impl TokenProvider for SharedToken {
    fn token(&self) -> Option<String> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
