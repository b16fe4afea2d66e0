use crate::{
    Result,
    entities::{Entity, EntityKey, EntityKind},
};
use futures::future::BoxFuture;
use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::sync::RwLock;

/// Storage contract used by the registry and its test harness.
pub trait Datastore: Send + Sync {
    /// Writes `inserts` as one batch: either every record is stored or none
    /// is. Existing records with the same key are replaced.
    fn commit(
        &self,
        inserts: Vec<Entity>,
    ) -> BoxFuture<'_, Result<()>>;

    fn lookup<'a>(
        &'a self,
        key: &'a EntityKey,
    ) -> BoxFuture<'a, Result<Option<Entity>>>;

    /// Every record of `kind`, in key order.
    fn query(
        &self,
        kind: EntityKind,
    ) -> BoxFuture<'_, Result<Vec<Entity>>>;

    /// Every record, in key order.
    fn scan(&self) -> BoxFuture<'_, Result<Vec<Entity>>>;
}

/// In-memory datastore backed by an ordered map.
#[derive(Default)]
pub struct MemDatastore {
    records: RwLock<BTreeMap<EntityKey, Entity>>,
    commits: AtomicUsize,
}

impl MemDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Datastore for MemDatastore {
    fn commit(
        &self,
        inserts: Vec<Entity>,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            for entity in &inserts {
                entity.validate()?;
            }

            let count = inserts.len();
            let mut records = self.records.write().await;
            for entity in inserts {
                records.insert(entity.key(), entity);
            }
            drop(records);

            self.commits
                .fetch_add(1, Ordering::SeqCst);
            tracing::debug!(records = count, "committed batch");

            Ok(())
        })
    }

    fn lookup<'a>(
        &'a self,
        key: &'a EntityKey,
    ) -> BoxFuture<'a, Result<Option<Entity>>> {
        Box::pin(async move {
            Ok(self
                .records
                .read()
                .await
                .get(key)
                .cloned())
        })
    }

    fn query(
        &self,
        kind: EntityKind,
    ) -> BoxFuture<'_, Result<Vec<Entity>>> {
        Box::pin(async move {
            Ok(self
                .records
                .read()
                .await
                .iter()
                .filter(|(key, _)| key.kind() == kind)
                .map(|(_, entity)| entity.clone())
                .collect())
        })
    }

    fn scan(&self) -> BoxFuture<'_, Result<Vec<Entity>>> {
        Box::pin(async move {
            Ok(self
                .records
                .read()
                .await
                .values()
                .cloned()
                .collect())
        })
    }
}
