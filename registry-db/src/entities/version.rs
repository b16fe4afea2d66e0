use super::{EntityKey, EntityKind, parse_version, typed};
use crate::{Datastore, Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PackageVersion {
    pub package: String,
    pub version: String,
    pub description: String,
    /// Dependency name to version constraint
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    pub uploader: Option<String>,
    pub published: DateTime<Utc>,
}

impl PackageVersion {
    pub fn key(&self) -> EntityKey {
        EntityKey::version(&self.package, &self.version)
    }

    pub fn semver(&self) -> Result<semver::Version> {
        parse_version(&self.version)
    }

    /// Versions of `package`, newest first.
    pub async fn list_for(
        db: &dyn Datastore,
        package: &str,
    ) -> Result<Vec<PackageVersion>> {
        let mut versions: Vec<(semver::Version, PackageVersion)> =
            typed::<PackageVersion>(db.query(EntityKind::Version).await?)
                .into_iter()
                .filter(|v| v.package == package)
                .map(|v| -> Result<(semver::Version, PackageVersion)> { Ok((v.semver()?, v)) })
                .collect::<Result<_>>()?;

        versions.sort_by(|(a, _), (b, _)| b.cmp(a));

        Ok(versions
            .into_iter()
            .map(|(_, v)| v)
            .collect())
    }

    pub async fn by_name_and_version(
        db: &dyn Datastore,
        package: &str,
        version: &str,
    ) -> Result<PackageVersion> {
        db.lookup(&EntityKey::version(package, version))
            .await?
            .and_then(|entity| PackageVersion::try_from(entity).ok())
            .ok_or_else(|| Error::NotFound(format!("version `{package}@{version}`")))
    }
}
