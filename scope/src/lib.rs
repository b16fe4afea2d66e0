//! Nestable execution scopes.
//!
//! A [`Scope`] carries typed service bindings that children inherit unless
//! they override them, and a list of teardown callbacks released in reverse
//! registration order when the scope closes. Scopes are passed explicitly;
//! nothing here is ambient or global.
//!
//! ```
//! # async fn demo() -> Result<(), depot_scope::ScopeError<std::convert::Infallible>> {
//! use depot_scope::{Key, Scope};
//!
//! const GREETING: Key<&'static str> = Key::new("greeting");
//!
//! let root = Scope::root();
//! root.set(&GREETING, "hello");
//!
//! root.enter(|child| async move {
//!     child.set(&GREETING, "hi");
//!     assert_eq!(child.get(&GREETING), Some("hi"));
//!     Ok::<_, std::convert::Infallible>(())
//! })
//! .await?;
//!
//! assert_eq!(root.get(&GREETING), Some("hello"));
//! # Ok(())
//! # }
//! ```

mod key;
mod scope;
mod teardown;

pub use key::Key;
pub use scope::{Scope, ScopeError};
pub use teardown::TeardownError;

/// Error type accepted from user supplied callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no binding registered for `{name}`")]
    MissingBinding { name: &'static str },

    #[error("scope {id} is already closed")]
    Closed { id: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
