//! Seeds the datastore and search index before a test body runs.

use crate::{
    Result,
    import::{AutoGeneratedSource, ImportSource, materialize},
    profile::TestProfile,
};
use depot_registry_db::entities::{Entity, Package, User, VersionReport};
use depot_scope::Scope;
use std::collections::HashMap;

/// A dataset ready to be committed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Baseline {
    /// Committed as one batch
    pub entities: Vec<Entity>,

    /// Derived analysis results, committed after `entities`
    pub reports: Vec<VersionReport>,

    /// Package name to popularity in `0.0..=1.0`
    pub popularity: HashMap<String, f64>,
}

impl Baseline {
    pub fn from_profile(
        profile: &TestProfile,
        source: &dyn ImportSource,
    ) -> Result<Self> {
        materialize(profile, source)
    }

    /// [`TestProfile::default_profile`] with generated content.
    pub fn default_baseline() -> Result<Self> {
        Self::from_profile(&TestProfile::default_profile(), &AutoGeneratedSource::default())
    }

    /// Adds a record as is, with no consistency checks.
    pub fn with_entity(
        mut self,
        entity: impl Into<Entity>,
    ) -> Self {
        self.entities.push(entity.into());
        self
    }

    pub fn package(
        &self,
        name: &str,
    ) -> Option<&Package> {
        self.entities
            .iter()
            .find_map(|entity| {
                match entity {
                    Entity::Package(package) if package.name == name => Some(package),
                    _ => None,
                }
            })
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.entities
            .iter()
            .filter_map(|entity| {
                match entity {
                    Entity::Package(package) => Some(package),
                    _ => None,
                }
            })
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.entities
            .iter()
            .filter_map(|entity| {
                match entity {
                    Entity::User(user) => Some(user),
                    _ => None,
                }
            })
    }
}

/// Commits `baseline` and brings the search index up to date with it.
///
/// Returns once the index reports ready. A failed commit leaves the
/// datastore untouched.
pub async fn populate(
    scope: &Scope,
    baseline: &Baseline,
) -> Result<()> {
    let db = depot_registry_db::datastore(scope)?;
    let index = depot_registry_search::search_index(scope)?;

    db.commit(baseline.entities.clone())
        .await?;

    if !baseline.reports.is_empty() {
        db.commit(
            baseline
                .reports
                .iter()
                .cloned()
                .map(Entity::from)
                .collect(),
        )
        .await?;
    }

    index.update_popularity(baseline.popularity.clone());
    let documents = index
        .update_all_packages(db.as_ref())
        .await?;

    index.mark_ready();
    index.wait_ready().await;

    tracing::info!(
        entities = baseline.entities.len(),
        reports = baseline.reports.len(),
        documents,
        "populated baseline"
    );
    Ok(())
}
