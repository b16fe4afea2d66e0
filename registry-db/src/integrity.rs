//! Referential consistency checks over the whole datastore.

use crate::{
    Datastore, Result,
    entities::{Entity, EntityKey, Package, PackageVersion, Publisher, User, VersionReport},
};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

/// One consistency violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub entity: EntityKey,
    pub message: String,
}

impl Problem {
    fn new(
        entity: EntityKey,
        message: impl Into<String>,
    ) -> Self {
        Self {
            entity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}: {}", self.entity, self.message)
    }
}

/// Read-only scan producing every [`Problem`] found, in key order.
pub struct IntegrityChecker<'a> {
    db: &'a dyn Datastore,
}

#[derive(Default)]
struct Snapshot {
    users: BTreeSet<String>,
    publishers: BTreeMap<String, Publisher>,
    packages: BTreeMap<String, Package>,
    versions: BTreeMap<(String, String), PackageVersion>,
    reports: Vec<VersionReport>,
}

impl Snapshot {
    fn from_entities(entities: Vec<Entity>) -> Self {
        let mut snapshot = Snapshot::default();

        for entity in entities {
            match entity {
                Entity::User(User { id, .. }) => {
                    snapshot.users.insert(id);
                },
                Entity::Publisher(publisher) => {
                    snapshot
                        .publishers
                        .insert(publisher.id.clone(), publisher);
                },
                Entity::Package(package) => {
                    snapshot
                        .packages
                        .insert(package.name.clone(), package);
                },
                Entity::Version(version) => {
                    snapshot.versions.insert(
                        (version.package.clone(), version.version.clone()),
                        version,
                    );
                },
                Entity::Report(report) => snapshot.reports.push(report),
            }
        }

        snapshot
    }

    fn has_version(
        &self,
        package: &str,
        version: &str,
    ) -> bool {
        self.versions
            .contains_key(&(package.to_string(), version.to_string()))
    }
}

impl<'a> IntegrityChecker<'a> {
    pub fn new(db: &'a dyn Datastore) -> Self {
        Self { db }
    }

    pub async fn check(&self) -> Result<Vec<Problem>> {
        let snapshot = Snapshot::from_entities(self.db.scan().await?);
        let mut problems = Vec::new();

        for publisher in snapshot.publishers.values() {
            if publisher.members.is_empty() {
                problems.push(Problem::new(publisher.key(), "publisher has no members"));
            }
            for member in &publisher.members {
                if !snapshot.users.contains(member) {
                    problems.push(Problem::new(
                        publisher.key(),
                        format!("member `{member}` does not exist"),
                    ));
                }
            }
        }

        for package in snapshot.packages.values() {
            if !snapshot.has_version(&package.name, &package.latest_version) {
                problems.push(Problem::new(
                    package.key(),
                    format!("latest version `{}` does not exist", package.latest_version),
                ));
            }

            match &package.publisher_id {
                Some(publisher) if !snapshot.publishers.contains_key(publisher) => {
                    problems.push(Problem::new(
                        package.key(),
                        format!("publisher `{publisher}` does not exist"),
                    ));
                },
                None if package.uploaders.is_empty() => {
                    problems.push(Problem::new(
                        package.key(),
                        "package has neither a publisher nor uploaders",
                    ));
                },
                _ => {},
            }

            for uploader in &package.uploaders {
                if !snapshot.users.contains(uploader) {
                    problems.push(Problem::new(
                        package.key(),
                        format!("uploader `{uploader}` does not exist"),
                    ));
                }
            }
        }

        for version in snapshot.versions.values() {
            if !snapshot
                .packages
                .contains_key(&version.package)
            {
                problems.push(Problem::new(
                    version.key(),
                    format!("package `{}` does not exist", version.package),
                ));
            }

            if let Some(uploader) = &version.uploader
                && !snapshot.users.contains(uploader)
            {
                problems.push(Problem::new(
                    version.key(),
                    format!("uploader `{uploader}` does not exist"),
                ));
            }
        }

        for report in &snapshot.reports {
            if !snapshot.has_version(&report.package, &report.version) {
                problems.push(Problem::new(
                    report.key(),
                    format!(
                        "version `{}@{}` does not exist",
                        report.package, report.version
                    ),
                ));
            }
        }

        if !problems.is_empty() {
            tracing::warn!(problems = problems.len(), "integrity check found problems");
        }

        Ok(problems)
    }
}
