use depot_scope::{Key, Scope};
use std::sync::Arc;

pub mod datastore;
pub mod entities;
pub mod integrity;
pub mod names;

#[cfg(any(test, feature = "test"))]
pub mod fixtures;

pub use datastore::{Datastore, MemDatastore};
pub use integrity::{IntegrityChecker, Problem};
pub use names::NameTracker;

/// Scope binding for the process datastore.
pub const DATASTORE: Key<Arc<dyn Datastore>> = Key::new("datastore");

/// Scope binding for the package name-lookup index.
pub const NAME_TRACKER: Key<Arc<NameTracker>> = Key::new("name-tracker");

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid version `{version}`: {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Scope error: {0}")]
    Scope(#[from] depot_scope::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Resolves the datastore bound in `scope`.
pub fn datastore(scope: &Scope) -> Result<Arc<dyn Datastore>> {
    Ok(scope.require(&DATASTORE)?)
}

/// Resolves the name tracker bound in `scope`.
pub fn name_tracker(scope: &Scope) -> Result<Arc<NameTracker>> {
    Ok(scope.require(&NAME_TRACKER)?)
}
