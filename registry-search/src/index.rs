use crate::{Error, Result};
use depot_registry_core::models::{PackageHit, SearchQuery, SearchResults};
use depot_registry_db::{
    Datastore,
    entities::{Package, PackageVersion},
};
use futures::future::BoxFuture;
use std::{
    collections::{BTreeMap, HashMap},
    sync::{PoisonError, RwLock},
};
use tokio::sync::watch;

const EXACT_NAME: f64 = 1.0;
const NAME_CONTAINS: f64 = 0.45;
const DESCRIPTION_CONTAINS: f64 = 0.2;

/// Search index contract consumed by the registry and the test harness.
pub trait SearchIndex: Send + Sync {
    /// Flags the index as serving. Idempotent.
    fn mark_ready(&self);

    fn is_ready(&self) -> bool;

    /// Resolves once [`SearchIndex::mark_ready`] has been called.
    fn wait_ready(&self) -> BoxFuture<'_, ()>;

    /// Re-ingests every package in `db`, returning the number of indexed
    /// documents.
    fn update_all_packages<'a>(
        &'a self,
        db: &'a dyn Datastore,
    ) -> BoxFuture<'a, Result<usize>>;

    /// Replaces popularity scores; values are clamped to `0.0..=1.0`.
    fn update_popularity(
        &self,
        scores: HashMap<String, f64>,
    );

    fn search<'a>(
        &'a self,
        query: &'a SearchQuery,
    ) -> BoxFuture<'a, Result<SearchResults>>;
}

#[derive(Debug, Clone)]
struct Document {
    name: String,
    description: String,
    is_discontinued: bool,
}

impl Document {
    fn text_score(
        &self,
        terms: &[String],
    ) -> f64 {
        if terms.is_empty() {
            return EXACT_NAME;
        }

        let name = self.name.to_lowercase();
        let description = self.description.to_lowercase();

        let mut total = 0.0;
        for term in terms {
            let score = if name == *term {
                EXACT_NAME
            } else if name.contains(term.as_str()) {
                NAME_CONTAINS
            } else if description.contains(term.as_str()) {
                DESCRIPTION_CONTAINS
            } else {
                // every term has to match somewhere
                return 0.0;
            };
            total += score;
        }

        total / terms.len() as f64
    }
}

/// In-memory index over the latest version of every package.
pub struct MemSearchIndex {
    documents: RwLock<BTreeMap<String, Document>>,
    popularity: RwLock<HashMap<String, f64>>,
    ready: watch::Sender<bool>,
}

impl Default for MemSearchIndex {
    fn default() -> Self {
        let (ready, _) = watch::channel(false);

        Self {
            documents: RwLock::default(),
            popularity: RwLock::default(),
            ready,
        }
    }
}

impl MemSearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn popularity_of(
        &self,
        name: &str,
    ) -> f64 {
        self.popularity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
            .unwrap_or_default()
    }

    fn rank(
        &self,
        query: &SearchQuery,
    ) -> Vec<PackageHit> {
        let terms = query.terms();
        let documents = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let mut hits: Vec<PackageHit> = documents
            .values()
            .filter(|doc| !doc.is_discontinued)
            .filter_map(|doc| {
                let text = doc.text_score(&terms);
                (text > 0.0).then(|| {
                    PackageHit {
                        package: doc.name.clone(),
                        score: text * (0.5 + 0.5 * self.popularity_of(&doc.name)),
                    }
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.package.cmp(&b.package))
        });

        hits
    }
}

impl SearchIndex for MemSearchIndex {
    fn mark_ready(&self) {
        if !self.ready.send_replace(true) {
            tracing::info!(documents = self.len(), "search index ready");
        }
    }

    fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    fn wait_ready(&self) -> BoxFuture<'_, ()> {
        let mut ready = self.ready.subscribe();

        Box::pin(async move {
            // the sender lives as long as `self`, so this only resolves on readiness
            let _ = ready.wait_for(|ready| *ready).await;
        })
    }

    fn update_all_packages<'a>(
        &'a self,
        db: &'a dyn Datastore,
    ) -> BoxFuture<'a, Result<usize>> {
        Box::pin(async move {
            let mut documents = BTreeMap::new();

            for package in Package::all(db).await? {
                let description =
                    match PackageVersion::by_name_and_version(db, &package.name, &package.latest_version)
                        .await
                    {
                        Ok(latest) => latest.description,
                        Err(depot_registry_db::Error::NotFound(_)) => {
                            tracing::warn!(
                                package = %package.name,
                                version = %package.latest_version,
                                "latest version missing, indexing without description"
                            );
                            String::new()
                        },
                        Err(err) => return Err(Error::from(err)),
                    };

                documents.insert(
                    package.name.clone(),
                    Document {
                        name: package.name,
                        description,
                        is_discontinued: package.is_discontinued,
                    },
                );
            }

            let count = documents.len();
            *self
                .documents
                .write()
                .unwrap_or_else(PoisonError::into_inner) = documents;

            tracing::info!(documents = count, "indexed packages");
            Ok(count)
        })
    }

    fn update_popularity(
        &self,
        scores: HashMap<String, f64>,
    ) {
        let scores = scores
            .into_iter()
            .map(|(name, score)| (name, score.clamp(0.0, 1.0)))
            .collect();

        *self
            .popularity
            .write()
            .unwrap_or_else(PoisonError::into_inner) = scores;
    }

    fn search<'a>(
        &'a self,
        query: &'a SearchQuery,
    ) -> BoxFuture<'a, Result<SearchResults>> {
        Box::pin(async move {
            if !self.is_ready() {
                return Err(Error::NotReady);
            }

            let hits = self.rank(query);
            let total_count = hits.len();

            let packages = hits
                .into_iter()
                .skip(query.offset())
                .take(query.limit())
                .collect();

            tracing::debug!(query = ?query.q, total_count, "search");

            Ok(SearchResults {
                total_count,
                packages,
            })
        })
    }
}
