use super::{Entity, EntityKey, EntityKind, typed};
use crate::{Datastore, Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Package {
    pub name: String,
    /// Owning publisher; packages without one are owned by their uploaders.
    pub publisher_id: Option<String>,
    #[serde(default)]
    pub uploaders: Vec<String>,
    pub latest_version: String,
    #[serde(default)]
    pub is_discontinued: bool,
    #[serde(default)]
    pub likes: u32,
    pub created: DateTime<Utc>,
}

impl Package {
    pub fn key(&self) -> EntityKey {
        EntityKey::Package(self.name.clone())
    }

    pub async fn find(
        db: &dyn Datastore,
        name: &str,
    ) -> Result<Option<Package>> {
        Ok(db
            .lookup(&EntityKey::Package(name.to_string()))
            .await?
            .and_then(|entity| Package::try_from(entity).ok()))
    }

    pub async fn by_name(
        db: &dyn Datastore,
        name: &str,
    ) -> Result<Package> {
        Self::find(db, name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("package `{name}`")))
    }

    /// All packages, ordered by name.
    pub async fn all(db: &dyn Datastore) -> Result<Vec<Package>> {
        Ok(typed(db.query(EntityKind::Package).await?))
    }

    /// Records a like and returns the updated package.
    pub async fn like(
        db: &dyn Datastore,
        name: &str,
    ) -> Result<Package> {
        let mut package = Self::by_name(db, name).await?;
        package.likes += 1;

        db.commit(vec![Entity::Package(package.clone())])
            .await?;

        Ok(package)
    }
}
