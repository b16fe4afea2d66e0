use super::EntityKey;
use crate::{Datastore, Error, Result};
use serde::{Deserialize, Serialize};

/// Analysis output computed for one package version.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VersionReport {
    pub package: String,
    pub version: String,
    pub granted_points: u32,
    pub max_points: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl VersionReport {
    pub fn key(&self) -> EntityKey {
        EntityKey::Report {
            package: self.package.clone(),
            version: self.version.clone(),
        }
    }

    pub async fn by_name_and_version(
        db: &dyn Datastore,
        package: &str,
        version: &str,
    ) -> Result<VersionReport> {
        let key = EntityKey::Report {
            package: package.to_string(),
            version: version.to_string(),
        };

        db.lookup(&key)
            .await?
            .and_then(|entity| VersionReport::try_from(entity).ok())
            .ok_or_else(|| Error::NotFound(format!("report for `{package}@{version}`")))
    }
}
