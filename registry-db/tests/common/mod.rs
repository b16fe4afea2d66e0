// Common test utilities for registry-db integration tests
// Re-exports fixtures and a scoped datastore context for use in test modules

use depot_registry_db::{DATASTORE, Datastore, MemDatastore, NAME_TRACKER, NameTracker};
use depot_scope::Scope;
use std::sync::Arc;

pub use depot_registry_db::{Error, Result, entities::*, fixtures};

/// A fresh datastore bound into a root scope.
pub struct TestDbCtx {
    pub scope: Scope,
    pub db: Arc<MemDatastore>,
}

impl TestDbCtx {
    pub fn new() -> Self {
        let db = Arc::new(MemDatastore::new());
        let scope = Scope::root();

        scope.set(&DATASTORE, db.clone() as Arc<dyn Datastore>);
        scope.set(&NAME_TRACKER, Arc::new(NameTracker::new()));

        Self { scope, db }
    }

    pub fn conn(&self) -> &dyn Datastore {
        self.db.as_ref()
    }
}
