use crate::{Datastore, Result, entities::Package};
use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

/// Case and separator insensitive index of package names.
///
/// Two names that reduce to the same key (`Foo_Bar`, `foobar`, `foo-bar`)
/// are considered conflicting; the first one tracked wins.
#[derive(Default)]
pub struct NameTracker {
    names: RwLock<BTreeMap<String, String>>,
}

/// Lowercases and strips `_` and `-`.
pub fn reduce(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

impl NameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the index with every package currently in `db`.
    pub async fn rebuild(
        &self,
        db: &dyn Datastore,
    ) -> Result<usize> {
        let mut names = BTreeMap::new();
        for package in Package::all(db).await? {
            names
                .entry(reduce(&package.name))
                .or_insert(package.name);
        }

        let count = names.len();
        *self
            .names
            .write()
            .unwrap_or_else(PoisonError::into_inner) = names;

        tracing::debug!(names = count, "rebuilt package name index");
        Ok(count)
    }

    pub fn track(
        &self,
        name: &str,
    ) {
        self.names
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(reduce(name))
            .or_insert_with(|| name.to_string());
    }

    /// Canonical name that `name` reduces to, if any.
    pub fn lookup(
        &self,
        name: &str,
    ) -> Option<String> {
        self.names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&reduce(name))
            .cloned()
    }

    /// An existing name that `candidate` would clash with.
    pub fn conflicts(
        &self,
        candidate: &str,
    ) -> Option<String> {
        self.lookup(candidate)
            .filter(|existing| existing != candidate)
    }

    /// Canonical names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemDatastore, fixtures};

    #[test]
    fn reduce_ignores_case_and_separators() {
        assert_eq!(reduce("Flutter_Titanium"), "fluttertitanium");
        assert_eq!(reduce("flutter-titanium"), "fluttertitanium");
    }

    #[tokio::test]
    async fn rebuild_reads_every_package() {
        let db = MemDatastore::new();
        db.commit(vec![
            fixtures::package().name("neon").build().into(),
            fixtures::package().name("flutter_titanium").build().into(),
        ])
        .await
        .unwrap();

        let tracker = NameTracker::new();
        tracker.track("stale");

        assert_eq!(tracker.rebuild(&db).await.unwrap(), 2);
        assert_eq!(tracker.names(), vec!["flutter_titanium", "neon"]);
        assert_eq!(tracker.lookup("FlutterTitanium").as_deref(), Some("flutter_titanium"));
        assert!(tracker.lookup("stale").is_none());
    }

    #[test]
    fn conflicts_only_for_different_spelling() {
        let tracker = NameTracker::new();
        tracker.track("neon");

        assert_eq!(tracker.conflicts("Ne_On").as_deref(), Some("neon"));
        assert!(tracker.conflicts("neon").is_none());
        assert!(tracker.conflicts("argon").is_none());
    }
}
